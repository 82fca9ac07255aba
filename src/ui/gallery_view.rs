// 相册界面状态 - 列表镜像、编辑选择和大图预览

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::gallery::GalleryController;

/// 大图预览
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePreview {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// 相册界面
pub struct GalleryView {
    controller: Arc<GalleryController>,
    /// 列表镜像，与存储列表下标一一对应
    items: Vec<PathBuf>,
    selected: BTreeSet<usize>,
}

impl GalleryView {
    pub fn new(controller: Arc<GalleryController>) -> Self {
        Self {
            controller,
            items: Vec::new(),
            selected: BTreeSet::new(),
        }
    }

    /// 重新加载列表
    pub async fn reload(&mut self) -> Result<usize, String> {
        let result = self.controller.load_images().await;
        self.items = self.controller.image_paths().await;
        self.selected.clear();
        result
    }

    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.controller.is_editing()
    }

    /// 切换编辑模式，退出时清空选择
    pub fn toggle_editing(&mut self) -> bool {
        let editing = self.controller.toggle_editing();
        if !editing {
            self.selected.clear();
        }
        editing
    }

    /// 选中的下标（升序）
    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// 点击条目
    ///
    /// 编辑模式下切换选中状态，否则返回大图预览
    pub async fn tap(&mut self, index: usize) -> Option<ImagePreview> {
        if index >= self.items.len() {
            return None;
        }

        if self.is_editing() {
            if !self.selected.remove(&index) {
                self.selected.insert(index);
            }
            return None;
        }

        let path = self.items[index].clone();
        let probe = path.clone();
        let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(&probe)).await;

        match dimensions {
            Ok(Ok((width, height))) => Some(ImagePreview {
                path,
                width,
                height,
            }),
            Ok(Err(e)) => {
                warn!("读取图片失败 {:?}: {}", path, e);
                None
            }
            Err(e) => {
                warn!("读取图片任务失败: {}", e);
                None
            }
        }
    }

    /// 删除选中的条目，返回删除数量
    ///
    /// 从大到小逐个删除，镜像同步移除删除成功的下标
    pub async fn delete_selected(&mut self) -> usize {
        let mut deleted = 0;

        for index in std::mem::take(&mut self.selected).into_iter().rev() {
            match self.controller.delete_image(index).await {
                Ok(()) => {
                    if index < self.items.len() {
                        self.items.remove(index);
                    }
                    deleted += 1;
                }
                Err(e) => debug!("保留删除失败的条目 {}: {}", index, e),
            }
        }

        deleted
    }

    /// 完成拍摄，清空相册
    pub async fn complete(&mut self) -> Result<(), String> {
        let result = self.controller.complete_session().await;
        self.items = self.controller.image_paths().await;
        self.selected.clear();
        result
    }

    /// 信息弹窗文本
    pub async fn info_message(&self) -> String {
        self.controller.gallery_info().await.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{ImageStoreActor, SystemStatusActor};
    use crate::camera::SimulatedCamera;
    use crate::capture::{CaptureConfig, CaptureController};
    use crate::event_bus::EventBus;
    use crate::storage::{ImageDirectory, StoredImageManager};
    use tempfile::tempdir;

    async fn gallery_with_images(root: PathBuf, count: u32) -> GalleryView {
        let event_bus = Arc::new(EventBus::new(64));
        let directory = ImageDirectory::new(root, "jpg");

        for i in 0..count {
            let img = image::RgbImage::from_pixel(8 + i, 4, image::Rgb([200, 100, 50]));
            img.save(directory.new_file_path()).unwrap();
        }

        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());
        let (store_actor, store) = ImageStoreActor::new(StoredImageManager::new(directory));
        tokio::spawn(store_actor.run());
        let (controller, capture) = CaptureController::new(
            Arc::new(SimulatedCamera::default()),
            event_bus.clone(),
            status.clone(),
            CaptureConfig::default(),
        );
        tokio::spawn(controller.run());

        GalleryView::new(Arc::new(GalleryController::new(
            store, capture, status, event_bus,
        )))
    }

    #[tokio::test]
    async fn test_tap_previews_only_outside_editing() {
        let temp_dir = tempdir().unwrap();
        let mut view = gallery_with_images(temp_dir.path().to_path_buf(), 2).await;
        assert_eq!(view.reload().await.unwrap(), 2);

        let preview = view.tap(0).await.unwrap();
        assert_eq!(preview.path, view.items()[0]);
        assert_eq!(preview.height, 4);
        assert!(view.tap(9).await.is_none());

        assert!(view.toggle_editing());
        assert!(view.tap(1).await.is_none());
        assert_eq!(view.selected(), vec![1]);

        // 再次点击取消选中
        view.tap(1).await;
        assert!(view.selected().is_empty());

        view.tap(0).await;
        assert!(!view.toggle_editing());
        assert!(view.selected().is_empty());
    }

    #[tokio::test]
    async fn test_delete_selected_matches_store() {
        let temp_dir = tempdir().unwrap();
        let mut view = gallery_with_images(temp_dir.path().to_path_buf(), 5).await;
        view.reload().await.unwrap();
        let before = view.items().to_vec();

        view.toggle_editing();
        // 选择顺序不影响结果
        view.tap(3).await;
        view.tap(0).await;
        view.tap(1).await;

        assert_eq!(view.delete_selected().await, 3);
        assert_eq!(view.items(), &[before[2].clone(), before[4].clone()]);
        assert_eq!(view.controller.image_paths().await, view.items());
        assert!(view.selected().is_empty());

        view.reload().await.unwrap();
        assert_eq!(view.items(), &[before[2].clone(), before[4].clone()]);
    }

    #[tokio::test]
    async fn test_complete_clears_gallery() {
        let temp_dir = tempdir().unwrap();
        let mut view = gallery_with_images(temp_dir.path().to_path_buf(), 3).await;
        view.reload().await.unwrap();

        assert!(view.info_message().await.contains("Image Count: 3"));
        view.complete().await.unwrap();
        assert!(view.is_empty());
        assert!(view.info_message().await.starts_with("Capture Size: 0.00 Byte"));
    }
}

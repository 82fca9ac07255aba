// 相册模块 - 图片列表浏览、批量删除和统计信息

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::actors::{ImageStoreHandle, SystemStatusHandle};
use crate::capture::CaptureHandle;
use crate::event_bus::{AppEvent, EventBus, GalleryChange};
use crate::models::{GalleryInfo, StorageUsage};
use crate::storage::DeletionReport;

/// 大小单位进制
const UNIT_SIZE: f64 = 1000.0;
/// 不足 1 KB 时的单位
const DEFAULT_UNIT: &str = "Byte";
const SIZE_UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// 格式化文件大小
///
/// 数值严格大于 1000 时才进位，最大单位为 TB
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = DEFAULT_UNIT;

    for next in SIZE_UNITS {
        if size <= UNIT_SIZE {
            break;
        }
        size /= UNIT_SIZE;
        unit = next;
    }

    format!("{:.2} {}", size, unit)
}

/// 相册控制器
pub struct GalleryController {
    store: ImageStoreHandle,
    capture: CaptureHandle,
    status: SystemStatusHandle,
    event_bus: Arc<EventBus>,
    is_editing: AtomicBool,
}

impl GalleryController {
    pub fn new(
        store: ImageStoreHandle,
        capture: CaptureHandle,
        status: SystemStatusHandle,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            capture,
            status,
            event_bus,
            is_editing: AtomicBool::new(false),
        }
    }

    /// 从磁盘刷新图片列表
    pub async fn load_images(&self) -> Result<usize, String> {
        match self.store.load().await {
            Ok(count) => {
                debug!("相册已加载: {} 张图片", count);
                self.publish(GalleryChange::ImagesRetrieved);
                Ok(count)
            }
            Err(e) => {
                warn!("加载相册失败: {}", e);
                self.publish(GalleryChange::Error(e.clone()));
                Err(e)
            }
        }
    }

    /// 删除单张图片
    pub async fn delete_image(&self, index: usize) -> Result<(), String> {
        let report = self.store.delete_image(index).await;
        match report.failures.into_iter().next() {
            None => Ok(()),
            Some(failure) => {
                warn!("删除第{}张图片失败: {}", index, failure.error);
                self.publish(GalleryChange::Error(failure.error.clone()));
                Err(failure.error)
            }
        }
    }

    /// 批量删除（按从大到小的下标执行）
    pub async fn delete_images(&self, indices: &[usize]) -> DeletionReport {
        let report = self.store.delete_images(indices.to_vec()).await;

        if !report.is_success() {
            let message = report
                .failures
                .iter()
                .map(|failure| format!("#{}: {}", failure.index, failure.error))
                .collect::<Vec<_>>()
                .join("; ");
            warn!("批量删除部分失败: {}", message);
            self.publish(GalleryChange::Error(message));
        }

        info!(
            "批量删除完成: 成功 {} 张, 失败 {} 张",
            report.removed.len(),
            report.failures.len()
        );
        report
    }

    /// 删除全部图片
    pub async fn delete_all_images(&self) -> Result<(), String> {
        self.store.delete_all().await.map_err(|e| {
            warn!("删除全部图片失败: {}", e);
            self.publish(GalleryChange::Error(e.clone()));
            e
        })
    }

    /// 图片总大小（格式化）
    pub async fn calculate_size_of_file(&self) -> String {
        format_file_size(self.store.total_size().await)
    }

    /// 切换编辑模式，返回新状态
    pub fn toggle_editing(&self) -> bool {
        let editing = !self.is_editing.fetch_xor(true, Ordering::SeqCst);
        debug!("编辑模式: {}", editing);
        editing
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing.load(Ordering::SeqCst)
    }

    /// 完成本次拍摄：删除全部图片并清零拍摄时长
    pub async fn complete_session(&self) -> Result<(), String> {
        let result = self.delete_all_images().await;
        self.capture.reset_elapsed().await;
        self.is_editing.store(false, Ordering::SeqCst);
        info!("拍摄会话已完成");
        result
    }

    /// 相册统计信息
    pub async fn gallery_info(&self) -> GalleryInfo {
        let total_size = self.store.total_size().await;
        let image_count = self.store.listing().await.len();
        let elapsed = self.capture.elapsed().await;

        self.status
            .update_storage_usage(StorageUsage {
                total_size,
                image_count,
            })
            .await;

        GalleryInfo {
            formatted_size: format_file_size(total_size),
            image_count,
            elapsed_secs: elapsed.as_secs(),
        }
    }

    /// 列表快照
    pub async fn image_paths(&self) -> Vec<PathBuf> {
        self.store.listing().await
    }

    pub async fn image_path(&self, index: usize) -> Option<PathBuf> {
        self.store.listing().await.into_iter().nth(index)
    }

    fn publish(&self, change: GalleryChange) {
        self.event_bus.publish(AppEvent::Gallery(change));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{ImageStoreActor, SystemStatusActor};
    use crate::camera::SimulatedCamera;
    use crate::capture::{CaptureConfig, CaptureController};
    use crate::storage::{ImageDirectory, StoredImageManager};
    use tempfile::tempdir;

    struct Fixture {
        gallery: GalleryController,
        directory: ImageDirectory,
        event_bus: Arc<EventBus>,
    }

    fn fixture(root: PathBuf) -> Fixture {
        let event_bus = Arc::new(EventBus::new(64));
        let directory = ImageDirectory::new(root, "jpg");

        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());

        let (store_actor, store) = ImageStoreActor::new(StoredImageManager::new(directory.clone()));
        tokio::spawn(store_actor.run());

        let (controller, capture) = CaptureController::new(
            Arc::new(SimulatedCamera::default()),
            event_bus.clone(),
            status.clone(),
            CaptureConfig::default(),
        );
        tokio::spawn(controller.run());

        Fixture {
            gallery: GalleryController::new(store, capture, status, event_bus.clone()),
            directory,
            event_bus,
        }
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.00 Byte");
        assert_eq!(format_file_size(1000), "1000.00 Byte");
        assert_eq!(format_file_size(1001), "1.00 KB");
        assert_eq!(format_file_size(4_000_000), "4.00 MB");
        assert_eq!(format_file_size(1_500_000), "1.50 MB");
        assert_eq!(format_file_size(2_000_000_000_000_000), "2000.00 TB");
    }

    #[tokio::test]
    async fn test_size_before_and_after_delete() {
        let temp_dir = tempdir().unwrap();
        let fx = fixture(temp_dir.path().to_path_buf());

        fx.directory
            .save_images(vec![
                Some(vec![1; 1_000_000]),
                Some(vec![2; 2_500_000]),
                Some(vec![3; 500_000]),
            ])
            .await;
        assert_eq!(fx.gallery.load_images().await.unwrap(), 3);
        assert_eq!(fx.gallery.calculate_size_of_file().await, "4.00 MB");

        let paths = fx.gallery.image_paths().await;
        let mut largest = None;
        for (index, path) in paths.iter().enumerate() {
            if ImageDirectory::file_size(path).await == Some(2_500_000) {
                largest = Some(index);
            }
        }

        fx.gallery.delete_image(largest.unwrap()).await.unwrap();
        assert_eq!(fx.gallery.image_paths().await.len(), 2);
        assert_eq!(fx.gallery.calculate_size_of_file().await, "1.50 MB");

        let info = fx.gallery.gallery_info().await;
        assert_eq!(info.image_count, 2);
        assert_eq!(info.formatted_size, "1.50 MB");
    }

    #[tokio::test]
    async fn test_load_failure_emits_error() {
        let temp_dir = tempdir().unwrap();
        let fx = fixture(temp_dir.path().join("missing"));
        let mut receiver = fx.event_bus.subscribe();

        assert!(fx.gallery.load_images().await.is_err());
        assert!(matches!(
            receiver.recv().await.unwrap(),
            AppEvent::Gallery(GalleryChange::Error(_))
        ));
    }

    #[tokio::test]
    async fn test_load_success_emits_images_retrieved() {
        let temp_dir = tempdir().unwrap();
        let fx = fixture(temp_dir.path().to_path_buf());
        let mut receiver = fx.event_bus.subscribe();

        assert_eq!(fx.gallery.load_images().await.unwrap(), 0);
        assert!(matches!(
            receiver.recv().await.unwrap(),
            AppEvent::Gallery(GalleryChange::ImagesRetrieved)
        ));
    }

    #[tokio::test]
    async fn test_batch_delete_and_complete_session() {
        let temp_dir = tempdir().unwrap();
        let fx = fixture(temp_dir.path().to_path_buf());

        fx.directory
            .save_images((0..4u8).map(|i| Some(vec![i; 16])).collect())
            .await;
        fx.gallery.load_images().await.unwrap();
        let before = fx.gallery.image_paths().await;

        let report = fx.gallery.delete_images(&[0, 3]).await;
        assert!(report.is_success());
        assert_eq!(
            fx.gallery.image_paths().await,
            vec![before[1].clone(), before[2].clone()]
        );
        assert_eq!(fx.gallery.image_path(1).await, Some(before[2].clone()));
        assert_eq!(fx.gallery.image_path(5).await, None);

        assert!(fx.gallery.toggle_editing());
        assert!(fx.gallery.is_editing());
        fx.gallery.complete_session().await.unwrap();
        assert!(!fx.gallery.is_editing());
        assert!(fx.gallery.image_paths().await.is_empty());
        assert_eq!(fx.gallery.load_images().await.unwrap(), 0);
        assert_eq!(fx.gallery.gallery_info().await.elapsed_secs, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_delete_reports_error() {
        let temp_dir = tempdir().unwrap();
        let fx = fixture(temp_dir.path().to_path_buf());
        fx.gallery.load_images().await.unwrap();
        let mut receiver = fx.event_bus.subscribe();

        assert!(fx.gallery.delete_image(7).await.is_err());
        assert!(matches!(
            receiver.recv().await.unwrap(),
            AppEvent::Gallery(GalleryChange::Error(_))
        ));
    }
}

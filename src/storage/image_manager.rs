// 图片存储管理器 - 维护已保存图片的列表
//
// 列表只由 load_images 从磁盘同步，其余操作假定列表与磁盘一致
// 由 ImageStoreActor 独占持有，所有修改都在同一个队列中执行

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use super::ImageDirectory;

/// 单个删除失败
#[derive(Debug, Clone, Serialize)]
pub struct DeletionFailure {
    /// 请求删除的下标
    pub index: usize,
    /// 对应文件（下标越界时为空）
    pub path: Option<PathBuf>,
    /// 错误信息
    pub error: String,
}

/// 批量删除结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReport {
    /// 成功删除的下标及文件，按下标降序
    pub removed: Vec<(usize, PathBuf)>,
    /// 删除失败的条目（列表中保留）
    pub failures: Vec<DeletionFailure>,
}

impl DeletionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 图片存储管理器
pub struct StoredImageManager {
    /// 图片目录
    directory: ImageDirectory,
    /// 图片文件列表
    image_paths: Vec<PathBuf>,
}

impl StoredImageManager {
    /// 创建管理器（列表为空，需调用 load_images）
    pub fn new(directory: ImageDirectory) -> Self {
        Self {
            directory,
            image_paths: Vec::new(),
        }
    }

    pub fn directory(&self) -> &ImageDirectory {
        &self.directory
    }

    /// 当前列表
    pub fn image_paths(&self) -> &[PathBuf] {
        &self.image_paths
    }

    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// 从磁盘重新读取列表（整体替换）
    pub async fn load_images(&mut self) -> Result<()> {
        let entries = self.directory.list_entries().await?;
        debug!("加载图片列表: {} 张", entries.len());
        self.image_paths = entries;
        Ok(())
    }

    /// 删除下标对应的文件，不修改列表
    pub async fn delete_image(&self, index: usize) -> Result<PathBuf> {
        let path = self
            .image_paths
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("图片下标超出范围: {} (共 {} 张)", index, self.len()))?;

        self.directory.remove_if_exists(&path).await?;
        Ok(path)
    }

    /// 从列表中移除条目
    pub fn remove_entry(&mut self, index: usize) -> Option<PathBuf> {
        if index < self.image_paths.len() {
            Some(self.image_paths.remove(index))
        } else {
            None
        }
    }

    /// 批量删除
    ///
    /// 下标去重后从大到小处理，保证尚未处理的下标不会因移除而偏移。
    /// 每个下标的文件和列表条目一起删除；某个失败时记录并继续，失败条目保留在列表中
    pub async fn delete_images(&mut self, indices: &[usize]) -> DeletionReport {
        let mut ordered = indices.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();

        let mut report = DeletionReport::default();
        for index in ordered {
            match self.delete_image(index).await {
                Ok(path) => {
                    self.remove_entry(index);
                    report.removed.push((index, path));
                }
                Err(e) => {
                    error!("删除图片失败 (下标 {}): {}", index, e);
                    report.failures.push(DeletionFailure {
                        index,
                        path: self.image_paths.get(index).cloned(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "批量删除完成: 成功 {} 张, 失败 {} 张",
            report.removed.len(),
            report.failures.len()
        );
        report
    }

    /// 删除全部图片
    ///
    /// 尽力删除每个文件，成功的条目从列表移除，失败的条目保留，
    /// 有失败时返回首个错误和失败数量
    pub async fn delete_all_images(&mut self) -> Result<()> {
        let mut remaining = Vec::new();
        let mut first_error: Option<String> = None;

        for path in std::mem::take(&mut self.image_paths) {
            if let Err(e) = self.directory.remove_if_exists(&path).await {
                error!("{}", e);
                first_error.get_or_insert_with(|| e.to_string());
                remaining.push(path);
            }
        }

        let failed = remaining.len();
        self.image_paths = remaining;

        match first_error {
            Some(err) => Err(anyhow!("{} 个文件删除失败，首个错误: {}", failed, err)),
            None => {
                info!("已删除全部图片");
                Ok(())
            }
        }
    }

    /// 计算列表中文件的总大小（字节），无法读取的文件按0计
    pub async fn calculate_size_of_file(&self) -> u64 {
        let mut total = 0u64;
        for path in &self.image_paths {
            if let Some(size) = ImageDirectory::file_size(path).await {
                total += size;
            }
        }
        total
    }

    /// 保存图片数据，不修改列表
    pub async fn save_images(&self, buffers: Vec<Option<Vec<u8>>>) -> Vec<PathBuf> {
        self.directory.save_images(buffers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    async fn manager_with(sizes: &[usize]) -> (TempDir, StoredImageManager) {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let mut manager = StoredImageManager::new(directory);

        for (i, size) in sizes.iter().enumerate() {
            manager.save_images(vec![Some(vec![i as u8; *size])]).await;
        }
        manager.load_images().await.unwrap();
        (temp_dir, manager)
    }

    #[tokio::test]
    async fn test_saved_images_are_listed_and_readable() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let mut manager = StoredImageManager::new(directory);

        let buffers = vec![vec![1u8; 10], vec![2u8; 20], vec![3u8; 30]];
        let saved = manager
            .save_images(buffers.iter().cloned().map(Some).collect())
            .await;
        assert_eq!(saved.len(), 3);
        // 保存不修改列表
        assert!(manager.is_empty());

        manager.load_images().await.unwrap();
        assert_eq!(manager.len(), 3);

        for (path, original) in saved.iter().zip(&buffers) {
            assert!(manager.image_paths().contains(path));
            assert_eq!(&tokio::fs::read(path).await.unwrap(), original);
        }
    }

    #[tokio::test]
    async fn test_load_images_fails_for_unreadable_directory() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().join("gone"), "jpg");
        let mut manager = StoredImageManager::new(directory);
        assert!(manager.load_images().await.is_err());
    }

    #[tokio::test]
    async fn test_delete_image_removes_identity() {
        let (_temp_dir, mut manager) = manager_with(&[5, 6, 7]).await;
        let target = manager.image_paths()[1].clone();

        let report = manager.delete_images(&[1]).await;
        assert!(report.is_success());
        assert_eq!(report.removed, vec![(1, target.clone())]);

        manager.load_images().await.unwrap();
        assert_eq!(manager.len(), 2);
        assert!(!manager.image_paths().contains(&target));
    }

    #[tokio::test]
    async fn test_batch_delete_is_order_independent() {
        let (_temp_dir, mut manager) = manager_with(&[1, 2, 3, 4, 5]).await;
        let original = manager.image_paths().to_vec();

        // 选择顺序打乱且有重复
        let report = manager.delete_images(&[1, 4, 3, 1]).await;
        assert!(report.is_success());
        let removed_indices: Vec<usize> = report.removed.iter().map(|(i, _)| *i).collect();
        assert_eq!(removed_indices, vec![4, 3, 1]);

        let expected = vec![original[0].clone(), original[2].clone()];
        assert_eq!(manager.image_paths(), expected.as_slice());

        manager.load_images().await.unwrap();
        let mut reloaded = manager.image_paths().to_vec();
        reloaded.sort();
        let mut expected_sorted = expected;
        expected_sorted.sort();
        assert_eq!(reloaded, expected_sorted);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_reported_without_aborting() {
        let (_temp_dir, mut manager) = manager_with(&[1, 2]).await;
        let report = manager.delete_images(&[7, 0]).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 7);
        assert!(report.failures[0].path.is_none());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_file_already_gone_still_removes_entry() {
        let (_temp_dir, mut manager) = manager_with(&[1, 2]).await;
        let path = manager.image_paths()[0].clone();
        tokio::fs::remove_file(&path).await.unwrap();

        let report = manager.delete_images(&[0]).await;
        assert!(report.is_success());
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_calculate_size_skips_missing_files() {
        let (_temp_dir, manager) = manager_with(&[100, 250, 50]).await;
        assert_eq!(manager.calculate_size_of_file().await, 400);

        let path = manager.image_paths()[0].clone();
        let removed = tokio::fs::metadata(&path).await.unwrap().len();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(manager.calculate_size_of_file().await, 400 - removed);
    }

    #[tokio::test]
    async fn test_delete_all_images_empties_listing() {
        let (_temp_dir, mut manager) = manager_with(&[3, 4, 5]).await;
        manager.delete_all_images().await.unwrap();
        assert!(manager.is_empty());

        manager.load_images().await.unwrap();
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_images_keeps_failed_entries() {
        let (temp_dir, mut manager) = manager_with(&[3, 4]).await;

        // 目录占用了文件名，remove_file 会失败
        let blocker = temp_dir.path().join("blocker.jpg");
        tokio::fs::create_dir(&blocker).await.unwrap();
        manager.image_paths.push(blocker.clone());

        let result = manager.delete_all_images().await;
        assert!(result.is_err());
        assert_eq!(manager.image_paths(), &[blocker]);
    }
}

// 图片目录 - 文档目录下的图片文件读写
//
// 目录本身就是索引，不维护清单文件
// 句柄可廉价克隆，后台保存任务持有克隆而不触碰内存中的列表

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Result};
use tracing::{debug, trace, warn};

/// 图片目录句柄
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    /// 文档目录
    root: PathBuf,
    /// 文件扩展名（不含点）
    extension: String,
}

impl ImageDirectory {
    /// 创建目录句柄
    pub fn new(root: PathBuf, extension: impl Into<String>) -> Self {
        Self {
            root,
            extension: extension.into(),
        }
    }

    /// 目录路径
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 文件扩展名
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 确保目录存在
    pub async fn ensure_exists(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| anyhow!("创建图片目录失败 {:?}: {}", self.root, e))
    }

    /// 列出目录中的全部文件
    ///
    /// 按修改时间升序，时间相同时按路径排序
    pub async fn list_entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| anyhow!("读取图片目录失败 {:?}: {}", self.root, e))?;

        let mut files: Vec<(Option<SystemTime>, PathBuf)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    trace!("读取文件元数据失败 {:?}: {}", path, e);
                    continue;
                }
            };

            if !metadata.is_file() {
                trace!("跳过非文件条目: {:?}", path);
                continue;
            }

            files.push((metadata.modified().ok(), path));
        }

        files.sort();
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// 生成新的唯一文件路径: <uuid>.<ext>
    pub fn new_file_path(&self) -> PathBuf {
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), self.extension);
        self.root.join(file_name)
    }

    /// 保存单张图片
    pub async fn save_image(&self, data: &[u8]) -> Result<PathBuf> {
        if data.is_empty() {
            return Err(anyhow!("图片数据为空"));
        }

        let path = self.new_file_path();
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| anyhow!("写入图片失败 {:?}: {}", path, e))?;

        trace!("图片已保存: {:?} ({} 字节)", path, data.len());
        Ok(path)
    }

    /// 批量保存图片
    ///
    /// 空数据直接跳过；写入失败只记录日志，不影响其余数据
    pub async fn save_images(&self, buffers: Vec<Option<Vec<u8>>>) -> Vec<PathBuf> {
        let mut saved = Vec::with_capacity(buffers.len());

        for buffer in buffers {
            let Some(data) = buffer else {
                continue;
            };
            if data.is_empty() {
                continue;
            }

            match self.save_image(&data).await {
                Ok(path) => saved.push(path),
                Err(e) => warn!("保存图片失败: {}", e),
            }
        }

        debug!("批量保存完成: {} 张", saved.len());
        saved
    }

    /// 删除文件（文件不存在时视为成功）
    pub async fn remove_if_exists(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            trace!("文件已不存在，跳过删除: {:?}", path);
            return Ok(());
        }

        tokio::fs::remove_file(path)
            .await
            .map_err(|e| anyhow!("删除图片失败 {:?}: {}", path, e))
    }

    /// 文件大小，无法读取时返回 None
    pub async fn file_size(path: &Path) -> Option<u64> {
        tokio::fs::metadata(path).await.ok().map(|m| m.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_images_skips_empty_buffers() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");

        let saved = directory
            .save_images(vec![Some(vec![1, 2, 3]), None, Some(Vec::new()), Some(vec![4])])
            .await;

        assert_eq!(saved.len(), 2);
        for path in &saved {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap();
            assert!(uuid::Uuid::parse_str(stem).is_ok());
        }
        assert_eq!(tokio::fs::read(&saved[0]).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_entries_skips_directories() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        tokio::fs::create_dir(temp_dir.path().join("nested"))
            .await
            .unwrap();
        directory.save_image(&[9, 9]).await.unwrap();

        let entries = directory.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_list_entries_missing_directory_fails() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().join("missing"), "jpg");
        assert!(directory.list_entries().await.is_err());
    }

    #[tokio::test]
    async fn test_remove_if_exists_tolerates_missing_file() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let path = directory.save_image(&[1]).await.unwrap();

        directory.remove_if_exists(&path).await.unwrap();
        directory.remove_if_exists(&path).await.unwrap();
        assert!(ImageDirectory::file_size(&path).await.is_none());
    }
}

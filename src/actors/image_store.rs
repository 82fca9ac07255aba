// Image Store Actor - 使用Actor模式管理图片列表
//
// StoredImageManager 只被这个Actor持有，列表的所有修改都在它的消息队列里串行执行
// 后台任务不能直接修改列表，只能通过Handle发送命令

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::storage::{DeletionReport, ImageDirectory, StoredImageManager};

/// 图片存储命令
pub enum ImageStoreCommand {
    /// 从磁盘重新加载列表
    Load {
        reply: oneshot::Sender<Result<usize, String>>,
    },

    /// 批量删除（文件和列表条目一起删除）
    DeleteImages {
        indices: Vec<usize>,
        reply: oneshot::Sender<DeletionReport>,
    },

    /// 删除全部
    DeleteAll {
        reply: oneshot::Sender<Result<(), String>>,
    },

    /// 计算总大小
    TotalSize {
        reply: oneshot::Sender<u64>,
    },

    /// 获取列表快照
    Listing {
        reply: oneshot::Sender<Vec<PathBuf>>,
    },
}

/// 图片存储Actor
pub struct ImageStoreActor {
    receiver: mpsc::Receiver<ImageStoreCommand>,
    manager: StoredImageManager,
}

impl ImageStoreActor {
    /// 创建新的Actor
    pub fn new(manager: StoredImageManager) -> (Self, ImageStoreHandle) {
        let (sender, receiver) = mpsc::channel(32);
        let directory = manager.directory().clone();
        let actor = Self { receiver, manager };
        let handle = ImageStoreHandle { sender, directory };
        (actor, handle)
    }

    /// 运行Actor
    pub async fn run(mut self) {
        tracing::info!("Image Store Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ImageStoreCommand::Load { reply } => {
                    let result = self
                        .manager
                        .load_images()
                        .await
                        .map(|_| self.manager.len())
                        .map_err(|e| e.to_string());
                    let _ = reply.send(result);
                }

                ImageStoreCommand::DeleteImages { indices, reply } => {
                    let report = self.manager.delete_images(&indices).await;
                    let _ = reply.send(report);
                }

                ImageStoreCommand::DeleteAll { reply } => {
                    let result = self
                        .manager
                        .delete_all_images()
                        .await
                        .map_err(|e| e.to_string());
                    let _ = reply.send(result);
                }

                ImageStoreCommand::TotalSize { reply } => {
                    let _ = reply.send(self.manager.calculate_size_of_file().await);
                }

                ImageStoreCommand::Listing { reply } => {
                    let _ = reply.send(self.manager.image_paths().to_vec());
                }
            }
        }

        tracing::info!("Image Store Actor 已停止");
    }
}

/// 图片存储Handle
#[derive(Clone)]
pub struct ImageStoreHandle {
    sender: mpsc::Sender<ImageStoreCommand>,
    directory: ImageDirectory,
}

impl ImageStoreHandle {
    /// 图片目录（后台保存使用）
    pub fn directory(&self) -> &ImageDirectory {
        &self.directory
    }

    /// 重新加载列表，返回图片数量
    pub async fn load(&self) -> Result<usize, String> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ImageStoreCommand::Load { reply })
            .await
            .map_err(|_| "图片存储已停止".to_string())?;
        rx.await.map_err(|_| "图片存储无响应".to_string())?
    }

    /// 删除单张图片
    pub async fn delete_image(&self, index: usize) -> DeletionReport {
        self.delete_images(vec![index]).await
    }

    /// 批量删除
    pub async fn delete_images(&self, indices: Vec<usize>) -> DeletionReport {
        let (reply, rx) = oneshot::channel();
        let request = ImageStoreCommand::DeleteImages {
            indices: indices.clone(),
            reply,
        };

        let stopped = || DeletionReport {
            removed: Vec::new(),
            failures: indices
                .iter()
                .map(|&index| crate::storage::DeletionFailure {
                    index,
                    path: None,
                    error: "图片存储已停止".to_string(),
                })
                .collect(),
        };

        if self.sender.send(request).await.is_err() {
            return stopped();
        }
        rx.await.unwrap_or_else(|_| stopped())
    }

    /// 删除全部图片
    pub async fn delete_all(&self) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ImageStoreCommand::DeleteAll { reply })
            .await
            .map_err(|_| "图片存储已停止".to_string())?;
        rx.await.map_err(|_| "图片存储无响应".to_string())?
    }

    /// 总大小（字节）
    pub async fn total_size(&self) -> u64 {
        let (reply, rx) = oneshot::channel();
        self.sender.send(ImageStoreCommand::TotalSize { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 列表快照
    pub async fn listing(&self) -> Vec<PathBuf> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(ImageStoreCommand::Listing { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 健康检查：Actor是否还在处理消息
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(ImageStoreCommand::Listing { reply }).await.is_err() {
            return false;
        }
        rx.await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_actor_serializes_listing_mutations() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let (actor, handle) = ImageStoreActor::new(StoredImageManager::new(directory));
        tokio::spawn(actor.run());

        handle
            .directory()
            .save_images(vec![Some(vec![1; 10]), Some(vec![2; 20]), Some(vec![3; 30])])
            .await;
        assert_eq!(handle.load().await.unwrap(), 3);
        assert_eq!(handle.total_size().await, 60);

        let listing = handle.listing().await;
        let report = handle.delete_images(vec![0, 2]).await;
        assert!(report.is_success());
        assert_eq!(handle.listing().await, vec![listing[1].clone()]);

        handle.delete_all().await.unwrap();
        assert!(handle.listing().await.is_empty());
        assert_eq!(handle.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stopped_actor_reports_failures() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let (actor, handle) = ImageStoreActor::new(StoredImageManager::new(directory));
        drop(actor);

        assert!(!handle.health_check().await);
        assert!(handle.load().await.is_err());
        let report = handle.delete_image(0).await;
        assert_eq!(report.failures.len(), 1);
    }
}

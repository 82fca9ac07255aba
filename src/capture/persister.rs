// 照片持久化 - 订阅拍照事件，在后台写入图片目录
//
// 写盘不经过捕获控制器的队列，慢速磁盘不会拖慢拍照节奏

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::actors::SystemStatusHandle;
use crate::event_bus::{AppEvent, CaptureChange, EventBus};
use crate::storage::ImageDirectory;

/// 照片持久化任务
pub struct CapturePersister {
    task: JoinHandle<()>,
}

impl CapturePersister {
    /// 启动持久化任务
    ///
    /// 在返回之前完成订阅，之后发布的照片都会被保存
    pub fn spawn(
        event_bus: Arc<EventBus>,
        directory: ImageDirectory,
        status: SystemStatusHandle,
    ) -> Self {
        let mut receiver = event_bus.subscribe();

        let task = tokio::spawn(async move {
            info!("照片持久化任务已启动: {}", directory.root().display());

            loop {
                match receiver.recv().await {
                    Ok(AppEvent::Capture(CaptureChange::ImageCaptured(data))) => {
                        let directory = directory.clone();
                        let status = status.clone();
                        let event_bus = event_bus.clone();
                        tokio::spawn(async move {
                            persist(&directory, &data, &status, &event_bus).await;
                        });
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("持久化任务落后，丢失 {} 个事件", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("事件总线已关闭");
                        break;
                    }
                }
            }

            info!("照片持久化任务已停止");
        });

        Self { task }
    }

    /// 停止持久化任务（已开始的写入会继续完成）
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn persist(
    directory: &ImageDirectory,
    data: &[u8],
    status: &SystemStatusHandle,
    event_bus: &EventBus,
) {
    let saved = directory.save_images(vec![Some(data.to_vec())]).await;
    if saved.is_empty() {
        error!("照片保存失败");
        status.set_error(Some("照片保存失败".to_string())).await;
        return;
    }

    status.record_saved(saved.len()).await;
    event_bus.publish(AppEvent::ImagesSaved { paths: saved });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::SystemStatusActor;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_captured_images_are_saved() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let event_bus = Arc::new(EventBus::new(64));
        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());

        let persister = CapturePersister::spawn(event_bus.clone(), directory.clone(), status.clone());
        let mut receiver = event_bus.subscribe();

        event_bus.publish(AppEvent::Capture(CaptureChange::ImageCaptured(Arc::new(
            vec![0xFF, 0xD8, 0xFF, 0xD9],
        ))));

        let paths = loop {
            let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
                .await
                .expect("等待保存超时")
                .unwrap();
            if let AppEvent::ImagesSaved { paths } = event {
                break paths;
            }
        };

        assert_eq!(paths.len(), 1);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(directory.list_entries().await.unwrap(), paths);
        assert_eq!(status.get().await.saved_frames, 1);

        persister.shutdown();
    }

    #[tokio::test]
    async fn test_empty_image_is_not_saved() {
        let temp_dir = tempdir().unwrap();
        let directory = ImageDirectory::new(temp_dir.path().to_path_buf(), "jpg");
        let event_bus = Arc::new(EventBus::new(64));
        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());

        let _persister = CapturePersister::spawn(event_bus.clone(), directory.clone(), status.clone());
        event_bus.publish(AppEvent::Capture(CaptureChange::ImageCaptured(Arc::new(Vec::new()))));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(directory.list_entries().await.unwrap().is_empty());
        assert_eq!(status.get().await.saved_frames, 0);
    }
}

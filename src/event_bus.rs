// 事件总线 - 用于模块间解耦通信
//
// 实现发布/订阅模式,替代回调闭包式的状态通知
// 使用 tokio::sync::broadcast 实现高效的事件分发

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 捕获控制器状态变化
#[derive(Debug, Clone)]
pub enum CaptureChange {
    /// 相机已授权，会话已初始化
    AuthorizedCamera,
    /// 无相机权限
    NoCameraAccess,
    /// 拍照完成（JPEG数据）
    ImageCaptured(Arc<Vec<u8>>),
    /// 非致命错误（拍照失败、设备配置失败）
    Error(String),
}

/// 相册状态变化
#[derive(Debug, Clone)]
pub enum GalleryChange {
    /// 图片列表已刷新
    ImagesRetrieved,
    /// 存储访问错误
    Error(String),
}

/// 应用事件枚举 - 定义所有可能的系统事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    // --- 捕获事件 ---

    /// 捕获控制器状态变化
    Capture(CaptureChange),

    // --- 相册事件 ---

    /// 相册状态变化
    Gallery(GalleryChange),

    // --- 存储事件 ---

    /// 后台保存完成
    ImagesSaved {
        paths: Vec<PathBuf>,
    },

    // --- 系统事件 ---

    /// 配置更新事件
    ConfigUpdated {
        config_type: String,
    },
}

/// 事件总线 - 用于模块间解耦通信
///
/// 使用 broadcast channel 实现发布/订阅模式
/// 支持多个订阅者同时接收事件
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小,建议 100-1000
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 发布事件
    ///
    /// 如果没有订阅者,事件会被丢弃(这是正常的)
    pub fn publish(&self, event: AppEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) => {
                // 没有订阅者,忽略错误
                tracing::trace!("事件已发布但无订阅者");
            }
        }
    }

    /// 订阅事件
    ///
    /// 返回一个接收器,可以用 `.recv().await` 接收事件
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_basic() {
        let bus = EventBus::new(100);

        // 订阅事件
        let mut receiver = bus.subscribe();

        // 发布事件
        bus.publish(AppEvent::Gallery(GalleryChange::ImagesRetrieved));

        // 接收事件
        match receiver.recv().await {
            Ok(AppEvent::Gallery(GalleryChange::ImagesRetrieved)) => {}
            _ => panic!("未收到预期事件"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(100);

        // 创建多个订阅者
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        // 发布事件
        bus.publish(AppEvent::Capture(CaptureChange::ImageCaptured(Arc::new(
            vec![0xFF, 0xD8],
        ))));

        // 两个订阅者都应该收到事件
        assert!(receiver1.try_recv().is_ok());
        assert!(receiver2.try_recv().is_ok());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(10);
        bus.publish(AppEvent::ConfigUpdated {
            config_type: "capture".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}

// 捕获领域管理器
//
// 负责相机会话和照片持久化相关的功能
// 包含 CameraDevice、CaptureHandle 和 CapturePersister 三个核心组件

use std::sync::Arc;
use tokio::sync::Mutex;
use crate::camera::CameraDevice;
use crate::capture::{CaptureHandle, CapturePersister};

/// 捕获领域管理器 - 负责相机会话和照片持久化
#[derive(Clone)]
pub struct CaptureDomain {
    camera: Arc<dyn CameraDevice>,
    capture: CaptureHandle,
    persister: Arc<Mutex<Option<CapturePersister>>>,
}

impl CaptureDomain {
    /// 创建新的捕获领域管理器
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        capture: CaptureHandle,
        persister: CapturePersister,
    ) -> Self {
        Self {
            camera,
            capture,
            persister: Arc::new(Mutex::new(Some(persister))),
        }
    }

    /// 获取相机设备
    pub fn get_camera(&self) -> &Arc<dyn CameraDevice> {
        &self.camera
    }

    /// 获取捕获控制器 Handle
    pub fn get_capture_handle(&self) -> &CaptureHandle {
        &self.capture
    }

    /// 停止照片持久化任务
    pub async fn stop_persister(&self) {
        if let Some(persister) = self.persister.lock().await.take() {
            persister.shutdown();
        }
    }
}

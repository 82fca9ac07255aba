// System Status Actor - 使用Actor模式管理系统状态
//
// 用消息传递替代Arc<RwLock<SystemStatus>>，消除锁竞争

use tokio::sync::{mpsc, oneshot};
use crate::models::{AuthorizationStatus, StorageUsage, SystemStatus};
use chrono::{DateTime, Utc};

/// 系统状态命令
pub enum SystemStatusCommand {
    /// 更新拍摄状态
    UpdateCapturing {
        is_capturing: bool,
    },

    /// 更新授权状态
    UpdateAuthorization {
        status: AuthorizationStatus,
    },

    /// 记录一次成功拍照
    RecordCapture {
        time: DateTime<Utc>,
    },

    /// 记录一次拍照失败
    RecordCaptureFailure {
        error: String,
    },

    /// 记录已保存的图片数量
    RecordSaved {
        count: usize,
    },

    /// 更新存储使用情况
    UpdateStorageUsage {
        usage: StorageUsage,
    },

    /// 设置错误信息
    SetError {
        error: Option<String>,
    },

    /// 获取状态
    Get {
        reply: oneshot::Sender<SystemStatus>,
    },
}

/// 系统状态Actor
pub struct SystemStatusActor {
    receiver: mpsc::Receiver<SystemStatusCommand>,
    status: SystemStatus,  // 无需RwLock
}

impl SystemStatusActor {
    /// 创建新的Actor
    pub fn new() -> (Self, SystemStatusHandle) {
        let (sender, receiver) = mpsc::channel(50);
        let actor = Self {
            receiver,
            status: SystemStatus::default(),
        };
        let handle = SystemStatusHandle { sender };
        (actor, handle)
    }

    /// 运行Actor
    pub async fn run(mut self) {
        tracing::info!("System Status Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SystemStatusCommand::UpdateCapturing { is_capturing } => {
                    self.status.is_capturing = is_capturing;
                }

                SystemStatusCommand::UpdateAuthorization { status } => {
                    self.status.authorization = Some(status);
                }

                SystemStatusCommand::RecordCapture { time } => {
                    self.status.captured_frames += 1;
                    self.status.last_capture_time = Some(time);
                }

                SystemStatusCommand::RecordCaptureFailure { error } => {
                    self.status.failed_captures += 1;
                    self.status.last_error = Some(error);
                }

                SystemStatusCommand::RecordSaved { count } => {
                    self.status.saved_frames += count as u64;
                }

                SystemStatusCommand::UpdateStorageUsage { usage } => {
                    self.status.storage_usage = usage;
                }

                SystemStatusCommand::SetError { error } => {
                    self.status.last_error = error;
                }

                SystemStatusCommand::Get { reply } => {
                    let _ = reply.send(self.status.clone());
                }
            }
        }

        tracing::info!("System Status Actor 已停止");
    }
}

/// 系统状态Handle
#[derive(Clone)]
pub struct SystemStatusHandle {
    sender: mpsc::Sender<SystemStatusCommand>,
}

impl SystemStatusHandle {
    /// 设置拍摄状态
    pub async fn set_capturing(&self, is_capturing: bool) {
        let _ = self.sender.send(SystemStatusCommand::UpdateCapturing { is_capturing }).await;
    }

    /// 设置授权状态
    pub async fn set_authorization(&self, status: AuthorizationStatus) {
        let _ = self.sender.send(SystemStatusCommand::UpdateAuthorization { status }).await;
    }

    /// 记录成功拍照
    pub async fn record_capture(&self, time: DateTime<Utc>) {
        let _ = self.sender.send(SystemStatusCommand::RecordCapture { time }).await;
    }

    /// 记录拍照失败
    pub async fn record_capture_failure(&self, error: String) {
        let _ = self.sender.send(SystemStatusCommand::RecordCaptureFailure { error }).await;
    }

    /// 记录保存数量
    pub async fn record_saved(&self, count: usize) {
        let _ = self.sender.send(SystemStatusCommand::RecordSaved { count }).await;
    }

    /// 更新存储使用情况
    pub async fn update_storage_usage(&self, usage: StorageUsage) {
        let _ = self.sender.send(SystemStatusCommand::UpdateStorageUsage { usage }).await;
    }

    /// 设置错误信息
    pub async fn set_error(&self, error: Option<String>) {
        let _ = self.sender.send(SystemStatusCommand::SetError { error }).await;
    }

    /// 获取系统状态
    pub async fn get(&self) -> SystemStatus {
        let (reply, rx) = oneshot::channel();
        self.sender.send(SystemStatusCommand::Get { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 健康检查：Actor是否还在处理消息
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(SystemStatusCommand::Get { reply }).await.is_err() {
            return false;
        }
        rx.await.is_ok()
    }
}

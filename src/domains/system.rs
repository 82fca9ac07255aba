// 系统领域管理器
//
// 负责系统状态和日志相关的功能
// 包含 SystemStatusHandle 和 LogBroadcaster 两个核心组件

use std::sync::Arc;
use crate::actors::SystemStatusHandle;
use crate::logger::LogBroadcaster;

/// 系统领域管理器 - 负责系统状态和日志
#[derive(Clone)]
pub struct SystemDomain {
    status: SystemStatusHandle,
    log_broadcaster: Arc<LogBroadcaster>,
}

impl SystemDomain {
    /// 创建新的系统领域管理器
    pub fn new(status: SystemStatusHandle, log_broadcaster: Arc<LogBroadcaster>) -> Self {
        Self { status, log_broadcaster }
    }

    /// 获取系统状态 Handle
    pub fn get_status_handle(&self) -> &SystemStatusHandle {
        &self.status
    }

    /// 获取日志广播器
    pub fn get_logger(&self) -> &Arc<LogBroadcaster> {
        &self.log_broadcaster
    }
}

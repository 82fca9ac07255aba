//! 系统控制命令
//!
//! 提供相机控制和系统状态监控接口，包括：
//! - 相机授权与会话初始化
//! - 拍照开关
//! - 系统状态查询

use crate::models::{StorageUsage, SystemStatus};
use crate::AppState;
use tracing::info;

/// 检查相机授权并初始化采集会话
///
/// 结果通过捕获事件通知（AuthorizedCamera / NoCameraAccess）
pub async fn setup_camera(state: &AppState) -> Result<(), String> {
    let capture = state.capture_domain.get_capture_handle();
    if !capture.health_check().await {
        return Err("捕获控制器未运行".to_string());
    }
    capture.setup().await;
    Ok(())
}

/// 切换拍照状态（开始/停止）
pub async fn toggle_capture(state: &AppState, enabled: bool) -> Result<(), String> {
    let capture = state.capture_domain.get_capture_handle();

    if enabled {
        info!("开始拍照");
        capture.start_capture().await;
    } else {
        info!("停止拍照");
        capture.stop_capture().await;
    }

    Ok(())
}

/// 获取系统状态
pub async fn get_system_status(state: &AppState) -> Result<SystemStatus, String> {
    let image_store = state.storage_domain.get_image_store();
    let usage = StorageUsage {
        total_size: image_store.total_size().await,
        image_count: image_store.listing().await.len(),
    };

    let status_handle = state.system_domain.get_status_handle();
    status_handle.update_storage_usage(usage).await;

    Ok(status_handle.get().await)
}

/// 停止拍照并释放相机
pub async fn teardown_camera(state: &AppState) -> Result<(), String> {
    state.capture_domain.get_capture_handle().teardown().await;
    Ok(())
}

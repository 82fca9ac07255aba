//! 配置管理命令
//!
//! 提供应用配置的读取和更新接口，包括：
//! - 应用配置的获取和更新
//! - 曝光参数的查询和调节

use std::time::Duration;

use crate::event_bus::AppEvent;
use crate::models::{AppConfig, ExposureBounds, ExposureSelection, PersistedAppConfig};
use crate::utils::validate_exposure;
use crate::AppState;
use tracing::info;

/// 获取应用配置
pub async fn get_app_config(state: &AppState) -> Result<PersistedAppConfig, String> {
    Ok(state.storage_domain.get_settings().get().await)
}

/// 更新配置
///
/// 拍照间隔在下次开始拍照时生效；目标分辨率和JPEG质量在下次启动时生效
pub async fn update_config(
    state: &AppState,
    config: AppConfig,
) -> Result<PersistedAppConfig, String> {
    let updated_config = state
        .storage_domain
        .get_settings()
        .update(config.clone())
        .await
        .map_err(|e| e.to_string())?;

    // 更新拍照间隔
    if config.capture_interval_ms.is_some() {
        state
            .capture_domain
            .get_capture_handle()
            .update_interval(Duration::from_millis(updated_config.capture_interval_ms))
            .await;
    }

    // 更新日志配置
    if let Some(logger_settings) = config.logger_settings {
        state
            .system_domain
            .get_logger()
            .set_enabled(logger_settings.enable_log_broadcast);
        info!(
            "日志配置已更新: 日志推送 = {}",
            logger_settings.enable_log_broadcast
        );
    }

    state.event_bus.publish(AppEvent::ConfigUpdated {
        config_type: "app_config".to_string(),
    });

    Ok(updated_config)
}

/// 获取曝光范围（没有活动会话时为空）
pub async fn get_exposure_bounds(state: &AppState) -> Result<Option<ExposureBounds>, String> {
    Ok(state
        .capture_domain
        .get_capture_handle()
        .exposure_bounds()
        .await)
}

/// 应用设置面板确认的曝光参数
///
/// 超出设备范围等错误通过捕获事件通知
pub async fn apply_exposure(state: &AppState, selection: ExposureSelection) -> Result<(), String> {
    validate_exposure(selection.iso, selection.exposure_duration)?;

    info!(
        "调节曝光: ISO {:.0}, 快门 {:.4}s",
        selection.iso, selection.exposure_duration
    );
    state
        .capture_domain
        .get_capture_handle()
        .set_exposure(selection.iso, selection.exposure_duration)
        .await;
    Ok(())
}

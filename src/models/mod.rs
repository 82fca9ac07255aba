// 数据模型模块 - 定义所有的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 重新导出其他模块的类型
pub use crate::camera::{AuthorizationStatus, DeviceFormat, ExposureBounds};

/// 应用配置（部分更新）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 拍照间隔（毫秒）
    pub capture_interval_ms: Option<u64>,
    /// 目标分辨率
    pub target_resolution: Option<TargetResolution>,
    /// JPEG质量(1-100)
    pub jpeg_quality: Option<u8>,
    /// 日志设置
    pub logger_settings: Option<LoggerSettings>,
}

/// 目标分辨率（选择最接近的设备格式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResolution {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetResolution {
    fn default() -> Self {
        // 12MP 4:3
        Self {
            width: 4000,
            height: 3000,
        }
    }
}

impl TargetResolution {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn display_name(&self) -> String {
        format!("{}×{}", self.width, self.height)
    }
}

/// 日志设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// 是否向界面层推送日志
    pub enable_log_broadcast: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            enable_log_broadcast: true,
        }
    }
}

/// 持久化的应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedAppConfig {
    /// 拍照间隔（毫秒）
    pub capture_interval_ms: u64,
    /// 目标分辨率
    pub target_resolution: TargetResolution,
    /// 图片扩展名
    pub image_extension: String,
    /// JPEG质量(1-100)
    pub jpeg_quality: u8,
    /// 事件总线缓冲区大小
    pub event_bus_capacity: usize,
    /// 日志设置
    pub logger_settings: LoggerSettings,
}

impl Default for PersistedAppConfig {
    fn default() -> Self {
        Self {
            capture_interval_ms: 200,
            target_resolution: TargetResolution::default(),
            image_extension: "jpg".to_string(),
            jpeg_quality: 90,
            event_bus_capacity: 256,
            logger_settings: LoggerSettings::default(),
        }
    }
}

/// 捕获控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// 未授权（或尚未完成授权）
    Unauthorized,
    /// 已授权，未在拍摄
    Idle,
    /// 定时拍摄中
    Capturing,
}

/// 系统状态
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    /// 是否正在拍摄
    pub is_capturing: bool,
    /// 相机授权状态
    pub authorization: Option<AuthorizationStatus>,
    /// 最后拍照时间
    pub last_capture_time: Option<DateTime<Utc>>,
    /// 已拍摄张数
    pub captured_frames: u64,
    /// 已保存张数
    pub saved_frames: u64,
    /// 拍照失败次数
    pub failed_captures: u64,
    /// 存储使用情况
    pub storage_usage: StorageUsage,
    /// 错误信息
    pub last_error: Option<String>,
}

/// 存储使用情况
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    /// 图片总大小（字节）
    pub total_size: u64,
    /// 图片数量
    pub image_count: usize,
}

/// 相册统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryInfo {
    /// 格式化后的总大小
    pub formatted_size: String,
    /// 图片数量
    pub image_count: usize,
    /// 累计拍摄时长（秒）
    pub elapsed_secs: u64,
}

impl GalleryInfo {
    /// 信息弹窗文本
    pub fn message(&self) -> String {
        format!(
            "Capture Size: {} \n Image Count: {} \n Capture Time: {:02}:{:02}",
            self.formatted_size,
            self.image_count,
            self.elapsed_secs / 60,
            self.elapsed_secs % 60
        )
    }
}

/// 设置面板确认的曝光参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureSelection {
    /// ISO
    pub iso: f32,
    /// 快门时长（秒）
    pub exposure_duration: f32,
}

// 相机模块 - 抽象相机设备能力
//
// 平台相机（授权、格式、曝光、拍照）统一通过 CameraDevice trait 访问
// 捕获控制器只依赖 trait，具体实现可替换为模拟传感器

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod simulated;

pub use simulated::SimulatedCamera;

/// 快门时长换算精度（微秒）
const EXPOSURE_TIMESCALE: f64 = 1_000_000.0;

/// 相机授权状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// 已授权
    Authorized,
    /// 尚未询问用户
    NotDetermined,
    /// 用户拒绝
    Denied,
    /// 系统限制
    Restricted,
}

/// 设备支持的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFormat {
    pub width: u32,
    pub height: u32,
}

impl DeviceFormat {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 像素总数
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// 曝光参数范围及当前值（快门时长单位：秒）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureBounds {
    pub min_iso: f32,
    pub max_iso: f32,
    pub min_exposure_duration: f64,
    pub max_exposure_duration: f64,
    pub current_iso: f32,
    pub current_exposure_duration: f64,
}

impl ExposureBounds {
    /// 检查ISO与快门时长是否都在设备范围内
    pub fn contains(&self, iso: f32, exposure_duration: f64) -> bool {
        (self.min_iso..=self.max_iso).contains(&iso)
            && (self.min_exposure_duration..=self.max_exposure_duration)
                .contains(&exposure_duration)
    }
}

/// 相机错误
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    #[error("相机未授权")]
    NotAuthorized,

    #[error("没有活动的采集会话")]
    NoActiveSession,

    #[error("设备配置失败: {0}")]
    Configuration(String),

    #[error("拍照失败: {0}")]
    Capture(String),

    #[error("相机不可用: {0}")]
    Unavailable(String),
}

/// 相机设备trait
///
/// 同步方法只读写设备状态，耗时操作（启动会话、拍照）为异步
#[async_trait::async_trait]
pub trait CameraDevice: Send + Sync {
    /// 当前授权状态
    fn authorization_status(&self) -> AuthorizationStatus;

    /// 请求相机权限，返回用户是否同意
    async fn request_access(&self) -> bool;

    /// 设备支持的格式列表
    fn formats(&self) -> Vec<DeviceFormat>;

    /// 设置当前输出格式
    fn set_active_format(&self, format: DeviceFormat) -> Result<(), CameraError>;

    /// 曝光参数范围
    fn exposure_bounds(&self) -> ExposureBounds;

    /// 设置自定义曝光（ISO + 快门时长）
    fn set_exposure_custom(&self, iso: f32, duration: Duration) -> Result<(), CameraError>;

    /// 启动采集会话
    async fn start_running(&self) -> Result<(), CameraError>;

    /// 停止采集会话
    fn stop_running(&self);

    /// 会话是否在运行
    fn is_running(&self) -> bool;

    /// 拍摄一张静态照片，返回编码后的JPEG数据
    async fn capture_photo(&self) -> Result<Vec<u8>, CameraError>;
}

/// 在设备格式中找出与目标像素数最接近的格式
///
/// 差值相同时保留先出现的格式
pub fn find_closest_format(formats: &[DeviceFormat], target_pixels: u64) -> Option<DeviceFormat> {
    let mut selected = None;
    let mut closest_difference = u64::MAX;

    for format in formats {
        let difference = format.pixel_count().abs_diff(target_pixels);
        if difference < closest_difference {
            closest_difference = difference;
            selected = Some(*format);
        }
    }

    selected
}

/// 将快门秒数换算为微秒精度的时长
///
/// 负数和非有限值按0处理
pub fn exposure_duration_from_secs(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((seconds * EXPOSURE_TIMESCALE).round() as u64)
}

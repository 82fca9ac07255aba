// 模拟相机 - 无硬件环境下的相机实现
//
// 生成带渐变和移动条纹的测试画面，亮度随ISO和快门时长变化
// 编码在阻塞线程池中完成，避免占用异步运行时

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use tracing::{debug, info, trace};

use super::{AuthorizationStatus, CameraDevice, CameraError, DeviceFormat, ExposureBounds};

/// 渲染尺寸上限，超出时按比例缩小
const MAX_RENDER_WIDTH: u32 = 1280;
const MAX_RENDER_HEIGHT: u32 = 960;

/// 基准曝光：ISO 100，1/60 秒
const BASE_ISO: f64 = 100.0;
const BASE_EXPOSURE_SECS: f64 = 1.0 / 60.0;

struct SimulatedState {
    authorization: AuthorizationStatus,
    grant_on_request: bool,
    formats: Vec<DeviceFormat>,
    active_format: Option<DeviceFormat>,
    exposure: ExposureBounds,
    running: bool,
    jpeg_quality: u8,
    capture_delay: Duration,
    start_delay: Duration,
    capture_failure: Option<String>,
    format_failure: Option<String>,
}

/// 模拟相机
#[derive(Clone)]
pub struct SimulatedCamera {
    state: Arc<RwLock<SimulatedState>>,
    frame_counter: Arc<AtomicU64>,
    access_requests: Arc<AtomicU64>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(AuthorizationStatus::Authorized)
    }
}

impl SimulatedCamera {
    /// 创建模拟相机
    pub fn new(authorization: AuthorizationStatus) -> Self {
        let state = SimulatedState {
            authorization,
            grant_on_request: true,
            formats: vec![
                DeviceFormat::new(640, 480),
                DeviceFormat::new(1280, 720),
                DeviceFormat::new(1920, 1080),
                DeviceFormat::new(3840, 2160),
                DeviceFormat::new(4032, 3024),
            ],
            active_format: None,
            exposure: ExposureBounds {
                min_iso: 32.0,
                max_iso: 3072.0,
                min_exposure_duration: 0.000_014,
                max_exposure_duration: 1.0,
                current_iso: 100.0,
                current_exposure_duration: BASE_EXPOSURE_SECS,
            },
            running: false,
            jpeg_quality: 90,
            capture_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            capture_failure: None,
            format_failure: None,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            frame_counter: Arc::new(AtomicU64::new(0)),
            access_requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 用户在权限弹窗中的选择
    pub fn with_grant_on_request(self, granted: bool) -> Self {
        self.write(|state| state.grant_on_request = granted);
        self
    }

    /// 替换支持的格式列表
    pub fn with_formats(self, formats: Vec<DeviceFormat>) -> Self {
        self.write(|state| state.formats = formats);
        self
    }

    /// JPEG质量(1-100)
    pub fn with_jpeg_quality(self, quality: u8) -> Self {
        self.write(|state| state.jpeg_quality = quality.clamp(1, 100));
        self
    }

    /// 每次拍照前的延迟，用于模拟处理中的拍照请求
    pub fn with_capture_delay(self, delay: Duration) -> Self {
        self.write(|state| state.capture_delay = delay);
        self
    }

    /// 启动会话前的延迟，模拟设备启动耗时
    pub fn with_start_delay(self, delay: Duration) -> Self {
        self.write(|state| state.start_delay = delay);
        self
    }

    /// 让后续拍照返回错误（None 恢复正常）
    pub fn set_capture_failure(&self, reason: Option<String>) {
        self.write(|state| state.capture_failure = reason);
    }

    /// 让设置格式返回错误（None 恢复正常）
    pub fn set_format_failure(&self, reason: Option<String>) {
        self.write(|state| state.format_failure = reason);
    }

    /// 当前生效的格式
    pub fn active_format(&self) -> Option<DeviceFormat> {
        self.read(|state| state.active_format)
    }

    /// 已拍摄的帧数
    pub fn frames_captured(&self) -> u64 {
        self.frame_counter.load(Ordering::SeqCst)
    }

    /// 权限请求次数
    pub fn access_requests(&self) -> u64 {
        self.access_requests.load(Ordering::SeqCst)
    }

    fn read<T>(&self, f: impl FnOnce(&SimulatedState) -> T) -> T {
        match self.state.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut SimulatedState) -> T) -> T {
        match self.state.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

/// 一帧的渲染参数
struct FrameSpec {
    width: u32,
    height: u32,
    gain: f64,
    frame_index: u64,
    quality: u8,
}

/// 计算渲染尺寸（按比例缩小到上限以内）
fn render_size(format: DeviceFormat) -> (u32, u32) {
    let scale_w = MAX_RENDER_WIDTH as f64 / format.width.max(1) as f64;
    let scale_h = MAX_RENDER_HEIGHT as f64 / format.height.max(1) as f64;
    let scale = scale_w.min(scale_h).min(1.0);

    let width = ((format.width as f64 * scale).round() as u32).max(1);
    let height = ((format.height as f64 * scale).round() as u32).max(1);
    (width, height)
}

/// 渲染并编码一帧
fn render_frame(spec: FrameSpec) -> Result<Vec<u8>, CameraError> {
    let FrameSpec {
        width,
        height,
        gain,
        frame_index,
        quality,
    } = spec;

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    // 移动条纹位置
    let bar_x = (frame_index * 8 % width as u64) as u32;

    for y in 0..height {
        for x in 0..width {
            let base_r = x as f64 / width as f64 * 200.0;
            let base_g = y as f64 / height as f64 * 200.0;
            let base_b = 96.0;

            let (r, g, b) = if x.abs_diff(bar_x) < 4 {
                (255.0, 255.0, 255.0)
            } else {
                (base_r * gain, base_g * gain, base_b * gain)
            };

            pixels.push(r.clamp(0.0, 255.0) as u8);
            pixels.push(g.clamp(0.0, 255.0) as u8);
            pixels.push(b.clamp(0.0, 255.0) as u8);
        }
    }

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder
        .encode(&pixels, width, height, ColorType::Rgb8)
        .map_err(|e| CameraError::Capture(format!("JPEG编码失败: {}", e)))?;

    Ok(encoded)
}

#[async_trait::async_trait]
impl CameraDevice for SimulatedCamera {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.read(|state| state.authorization)
    }

    async fn request_access(&self) -> bool {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.write(|state| {
            state.authorization = if state.grant_on_request {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            state.grant_on_request
        });
        info!("模拟相机权限请求结果: {}", granted);
        granted
    }

    fn formats(&self) -> Vec<DeviceFormat> {
        self.read(|state| state.formats.clone())
    }

    fn set_active_format(&self, format: DeviceFormat) -> Result<(), CameraError> {
        self.write(|state| {
            if let Some(reason) = &state.format_failure {
                return Err(CameraError::Configuration(reason.clone()));
            }
            if !state.formats.contains(&format) {
                return Err(CameraError::Configuration(format!(
                    "不支持的格式 {}x{}",
                    format.width, format.height
                )));
            }
            state.active_format = Some(format);
            debug!("模拟相机格式: {}x{}", format.width, format.height);
            Ok(())
        })
    }

    fn exposure_bounds(&self) -> ExposureBounds {
        self.read(|state| state.exposure)
    }

    fn set_exposure_custom(&self, iso: f32, duration: Duration) -> Result<(), CameraError> {
        let seconds = duration.as_secs_f64();
        self.write(|state| {
            if !state.exposure.contains(iso, seconds) {
                return Err(CameraError::Configuration(format!(
                    "曝光参数超出范围: ISO {} / 快门 {:.6}s",
                    iso, seconds
                )));
            }
            state.exposure.current_iso = iso;
            state.exposure.current_exposure_duration = seconds;
            Ok(())
        })
    }

    async fn start_running(&self) -> Result<(), CameraError> {
        let delay = self.read(|state| state.start_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.write(|state| {
            if state.authorization != AuthorizationStatus::Authorized {
                return Err(CameraError::NotAuthorized);
            }
            if state.formats.is_empty() {
                return Err(CameraError::Unavailable("没有可用的相机格式".to_string()));
            }
            state.running = true;
            Ok(())
        })
    }

    fn stop_running(&self) {
        self.write(|state| state.running = false);
    }

    fn is_running(&self) -> bool {
        self.read(|state| state.running)
    }

    async fn capture_photo(&self) -> Result<Vec<u8>, CameraError> {
        let delay = self.read(|state| state.capture_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let spec = self.read(|state| {
            if let Some(reason) = &state.capture_failure {
                return Err(CameraError::Capture(reason.clone()));
            }
            if !state.running {
                return Err(CameraError::Capture("采集会话未运行".to_string()));
            }

            let format = state
                .active_format
                .or_else(|| state.formats.first().copied())
                .unwrap_or(DeviceFormat::new(640, 480));
            let (width, height) = render_size(format);
            let exposure = state.exposure;
            let gain = (exposure.current_iso as f64 / BASE_ISO)
                * (exposure.current_exposure_duration / BASE_EXPOSURE_SECS);

            Ok(FrameSpec {
                width,
                height,
                gain: gain.clamp(0.05, 4.0),
                frame_index: 0,
                quality: state.jpeg_quality,
            })
        })?;

        let frame_index = self.frame_counter.fetch_add(1, Ordering::SeqCst);
        let spec = FrameSpec { frame_index, ..spec };

        let encoded = tokio::task::spawn_blocking(move || render_frame(spec))
            .await
            .map_err(|e| CameraError::Capture(format!("渲染任务失败: {}", e)))??;

        trace!("模拟相机拍照完成: 第{}帧, {} 字节", frame_index, encoded.len());
        Ok(encoded)
    }
}

// 主界面状态 - 取景预览、录制切换、最后一张照片和曝光设置入口

use tracing::{debug, warn};

use super::bottom_bar::BottomBar;
use super::settings_sheet::SettingsSheet;
use crate::capture::CaptureHandle;
use crate::event_bus::CaptureChange;

/// 最后一张照片的预览信息
#[derive(Debug, Clone, PartialEq)]
pub struct LastImagePreview {
    pub width: u32,
    pub height: u32,
    /// 高宽比，预览框按此比例设置高度
    pub aspect_ratio: f64,
}

/// 主界面
pub struct MainView {
    capture: CaptureHandle,
    bottom_bar: BottomBar,
    preview_attached: bool,
    no_camera_access: bool,
    last_error: Option<String>,
    last_image: Option<LastImagePreview>,
    last_image_hidden: bool,
}

impl MainView {
    pub fn new(capture: CaptureHandle) -> Self {
        Self {
            capture,
            bottom_bar: BottomBar::new(),
            preview_attached: false,
            no_camera_access: false,
            last_error: None,
            last_image: None,
            last_image_hidden: true,
        }
    }

    /// 处理捕获控制器事件
    pub fn apply_change(&mut self, change: &CaptureChange) {
        match change {
            CaptureChange::AuthorizedCamera => {
                self.preview_attached = true;
                self.no_camera_access = false;
            }
            CaptureChange::NoCameraAccess => {
                self.no_camera_access = true;
            }
            CaptureChange::ImageCaptured(_) => {
                // 保存由持久化任务完成
            }
            CaptureChange::Error(message) => {
                self.last_error = Some(message.clone());
            }
        }
    }

    /// 点击录制按钮，返回是否正在录制
    pub async fn toggle_record(&mut self) -> bool {
        let should_start_recording = self.bottom_bar.toggle_record();
        self.last_image_hidden = should_start_recording;

        if should_start_recording {
            self.capture.start_capture().await;
        } else {
            self.capture.stop_capture().await;
            self.show_last_captured_image().await;
        }

        should_start_recording
    }

    async fn show_last_captured_image(&mut self) {
        let Some(data) = self.capture.last_image().await else {
            debug!("还没有拍摄的照片");
            return;
        };

        match image::load_from_memory(&data) {
            Ok(img) => {
                let (width, height) = (img.width(), img.height());
                self.last_image = Some(LastImagePreview {
                    width,
                    height,
                    aspect_ratio: height as f64 / width.max(1) as f64,
                });
            }
            Err(e) => warn!("解码最后一张照片失败: {}", e),
        }
    }

    /// 打开曝光设置面板
    pub async fn open_settings(&self) -> SettingsSheet {
        let mut sheet = SettingsSheet::new();
        sheet.configure(self.capture.exposure_bounds().await);
        sheet
    }

    /// 设置面板确认后应用曝光
    pub async fn apply_settings(&self, sheet: &SettingsSheet) -> bool {
        match sheet.confirm() {
            Some(selection) => {
                self.capture
                    .set_exposure(selection.iso, selection.exposure_duration)
                    .await;
                true
            }
            None => false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.bottom_bar.is_recording()
    }

    pub fn bottom_bar(&self) -> &BottomBar {
        &self.bottom_bar
    }

    pub fn preview_attached(&self) -> bool {
        self.preview_attached
    }

    pub fn no_camera_access(&self) -> bool {
        self.no_camera_access
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 可见的最后一张照片（录制中隐藏）
    pub fn last_image(&self) -> Option<&LastImagePreview> {
        if self.last_image_hidden {
            None
        } else {
            self.last_image.as_ref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::SystemStatusActor;
    use crate::camera::{AuthorizationStatus, CameraDevice, DeviceFormat, SimulatedCamera};
    use crate::capture::{CaptureConfig, CaptureController};
    use crate::event_bus::{AppEvent, EventBus};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_record_toggle_shows_last_image() {
        let camera = SimulatedCamera::new(AuthorizationStatus::Authorized)
            .with_formats(vec![DeviceFormat::new(64, 48)]);
        let event_bus = Arc::new(EventBus::new(64));
        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());
        let (controller, capture) = CaptureController::new(
            Arc::new(camera.clone()),
            event_bus.clone(),
            status,
            CaptureConfig {
                interval: Duration::from_millis(20),
                target_pixels: 64 * 48,
            },
        );
        tokio::spawn(controller.run());

        let mut view = MainView::new(capture.clone());
        let mut receiver = event_bus.subscribe();
        capture.setup().await;

        // 等待授权事件和会话启动
        loop {
            if let Ok(AppEvent::Capture(change)) = receiver.recv().await {
                view.apply_change(&change);
                if view.preview_attached() {
                    break;
                }
            }
        }
        while !camera.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(view.toggle_record().await);
        assert!(view.last_image().is_none());

        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
                .await
                .expect("等待拍照超时")
                .unwrap();
            if let AppEvent::Capture(CaptureChange::ImageCaptured(_)) = event {
                break;
            }
        }

        assert!(!view.toggle_record().await);
        let preview = view.last_image().unwrap();
        assert_eq!((preview.width, preview.height), (64, 48));
        assert!((preview.aspect_ratio - 0.75).abs() < f64::EPSILON);

        let mut sheet = view.open_settings().await;
        assert!(sheet.is_configured());
        sheet.set_iso(200.0);
        assert!(view.apply_settings(&sheet).await);
        assert_eq!(capture.exposure_bounds().await.unwrap().current_iso, 200.0);
    }

    #[tokio::test]
    async fn test_events_update_view_state() {
        let event_bus = Arc::new(EventBus::new(8));
        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());
        let (controller, capture) = CaptureController::new(
            Arc::new(SimulatedCamera::new(AuthorizationStatus::Denied)),
            event_bus,
            status,
            CaptureConfig::default(),
        );
        tokio::spawn(controller.run());

        let mut view = MainView::new(capture);
        view.apply_change(&CaptureChange::NoCameraAccess);
        view.apply_change(&CaptureChange::Error("拍照失败".to_string()));

        assert!(view.no_camera_access());
        assert!(!view.preview_attached());
        assert_eq!(view.last_error(), Some("拍照失败"));

        // 没有会话时设置面板不可用
        let sheet = view.open_settings().await;
        assert!(!sheet.is_configured());
        assert!(!view.apply_settings(&sheet).await);
    }
}

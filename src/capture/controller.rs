// 捕获控制器 - 相机授权、会话初始化、定时拍照和曝光调节
//
// 控制器是一个Actor：会话状态只在它的消息队列中修改。
// 权限请求、会话启动、拍照都在后台任务中执行，结果投递回队列后再处理

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use super::scheduler::CaptureTimer;
use crate::actors::SystemStatusHandle;
use crate::camera::{
    exposure_duration_from_secs, find_closest_format, AuthorizationStatus, CameraDevice,
    CameraError, DeviceFormat, ExposureBounds,
};
use crate::event_bus::{AppEvent, CaptureChange, EventBus};
use crate::models::CaptureState;

/// 捕获控制器配置
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// 拍照间隔
    pub interval: Duration,
    /// 目标像素数
    pub target_pixels: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            target_pixels: 4000 * 3000,
        }
    }
}

/// 捕获控制器命令
pub enum CaptureCommand {
    /// 检查授权并初始化会话
    Setup,

    /// 权限请求结果（后台任务投递）
    AccessResolved {
        granted: bool,
    },

    /// 会话启动完成（后台任务投递）
    SessionStarted {
        result: Result<(), CameraError>,
    },

    /// 开始定时拍照
    StartCapture,

    /// 停止定时拍照
    StopCapture,

    /// 定时器触发（定时器投递）
    Tick,

    /// 拍照完成（后台任务投递）
    PhotoFinished {
        result: Result<Vec<u8>, CameraError>,
    },

    /// 设置曝光参数
    SetExposure {
        iso: f32,
        exposure_duration: f32,
    },

    /// 更新拍照间隔，下次开始拍照时生效
    UpdateInterval {
        interval: Duration,
    },

    /// 清零累计拍摄时长
    ResetElapsed,

    /// 获取曝光范围
    GetExposureBounds {
        reply: oneshot::Sender<Option<ExposureBounds>>,
    },

    /// 获取最后一张照片
    GetLastImage {
        reply: oneshot::Sender<Option<Arc<Vec<u8>>>>,
    },

    /// 获取状态快照
    GetSnapshot {
        reply: oneshot::Sender<CaptureSnapshot>,
    },

    /// 停止并释放会话
    Teardown {
        reply: oneshot::Sender<()>,
    },
}

/// 捕获控制器状态快照
#[derive(Debug, Clone, Serialize)]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    /// 是否存在采集会话
    pub session_active: bool,
    /// 会话使用的格式
    pub active_format: Option<DeviceFormat>,
    /// 累计拍摄时长
    pub elapsed: Duration,
    /// 处理中的拍照请求数
    pub pending_captures: usize,
    /// 当前拍照间隔
    pub interval: Duration,
}

/// 采集会话
struct CaptureSession {
    active_format: Option<DeviceFormat>,
}

/// 捕获控制器Actor
pub struct CaptureController {
    receiver: mpsc::Receiver<CaptureCommand>,
    /// 投递回自身队列（弱引用，Handle全部释放后Actor退出）
    queue: mpsc::WeakSender<CaptureCommand>,
    camera: Arc<dyn CameraDevice>,
    event_bus: Arc<EventBus>,
    status: SystemStatusHandle,
    config: CaptureConfig,
    state: CaptureState,
    authorized: bool,
    access_requested: bool,
    session: Option<CaptureSession>,
    timer: Option<CaptureTimer>,
    last_image: Option<Arc<Vec<u8>>>,
    elapsed: Duration,
    capture_started: Option<Instant>,
    pending_captures: usize,
}

impl CaptureController {
    /// 创建新的控制器
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        event_bus: Arc<EventBus>,
        status: SystemStatusHandle,
        config: CaptureConfig,
    ) -> (Self, CaptureHandle) {
        let (sender, receiver) = mpsc::channel(64);
        let controller = Self {
            receiver,
            queue: sender.downgrade(),
            camera,
            event_bus,
            status,
            config,
            state: CaptureState::Unauthorized,
            authorized: false,
            access_requested: false,
            session: None,
            timer: None,
            last_image: None,
            elapsed: Duration::ZERO,
            capture_started: None,
            pending_captures: 0,
        };
        (controller, CaptureHandle { sender })
    }

    /// 运行Actor
    pub async fn run(mut self) {
        info!("捕获控制器已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                CaptureCommand::Setup => self.setup().await,
                CaptureCommand::AccessResolved { granted } => self.on_access_resolved(granted).await,
                CaptureCommand::SessionStarted { result } => self.on_session_started(result),
                CaptureCommand::StartCapture => self.start_capture().await,
                CaptureCommand::StopCapture => self.stop_capture().await,
                CaptureCommand::Tick => self.on_tick(),
                CaptureCommand::PhotoFinished { result } => self.on_photo_finished(result).await,
                CaptureCommand::SetExposure {
                    iso,
                    exposure_duration,
                } => self.set_exposure(iso, exposure_duration).await,
                CaptureCommand::UpdateInterval { interval } => {
                    info!("拍照间隔更新为: {}毫秒", interval.as_millis());
                    self.config.interval = interval;
                }
                CaptureCommand::ResetElapsed => self.reset_elapsed(),
                CaptureCommand::GetExposureBounds { reply } => {
                    let bounds = self.session.as_ref().map(|_| self.camera.exposure_bounds());
                    let _ = reply.send(bounds);
                }
                CaptureCommand::GetLastImage { reply } => {
                    let _ = reply.send(self.last_image.clone());
                }
                CaptureCommand::GetSnapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                CaptureCommand::Teardown { reply } => {
                    self.teardown().await;
                    let _ = reply.send(());
                }
            }
        }

        self.teardown().await;
        info!("捕获控制器已停止");
    }

    async fn setup(&mut self) {
        let status = self.camera.authorization_status();
        info!("相机授权状态: {:?}", status);
        self.status.set_authorization(status).await;

        match status {
            AuthorizationStatus::Authorized => {
                self.authorized = true;
                self.initialize_session();
                self.publish(CaptureChange::AuthorizedCamera);
            }
            AuthorizationStatus::NotDetermined => {
                if self.access_requested {
                    debug!("权限请求已在进行中");
                    return;
                }
                self.access_requested = true;

                let camera = self.camera.clone();
                let queue = self.queue.clone();
                tokio::spawn(async move {
                    let granted = camera.request_access().await;
                    if let Some(sender) = queue.upgrade() {
                        let _ = sender.send(CaptureCommand::AccessResolved { granted }).await;
                    }
                });
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                self.deny_access().await;
            }
        }
    }

    async fn on_access_resolved(&mut self, granted: bool) {
        self.access_requested = false;
        if granted {
            info!("用户已授予相机权限");
            self.authorized = true;
            self.status.set_authorization(AuthorizationStatus::Authorized).await;
            self.initialize_session();
            self.publish(CaptureChange::AuthorizedCamera);
        } else {
            self.status.set_authorization(AuthorizationStatus::Denied).await;
            self.deny_access().await;
        }
    }

    async fn deny_access(&mut self) {
        warn!("无相机权限");
        self.authorized = false;
        self.state = CaptureState::Unauthorized;
        self.publish(CaptureChange::NoCameraAccess);
    }

    /// 选择格式、挂载输出并在后台启动会话
    fn initialize_session(&mut self) {
        if self.session.is_some() {
            debug!("采集会话已存在，跳过初始化");
            self.state = self.idle_or_capturing();
            return;
        }

        let formats = self.camera.formats();
        let selected = find_closest_format(&formats, self.config.target_pixels);

        let active_format = match selected {
            Some(format) => match self.camera.set_active_format(format) {
                Ok(()) => {
                    info!("已选择格式: {}x{}", format.width, format.height);
                    Some(format)
                }
                Err(e) => {
                    // 格式设置失败不影响会话启动
                    error!("设置相机格式失败: {}", e);
                    self.publish(CaptureChange::Error(e.to_string()));
                    None
                }
            },
            None => {
                warn!("相机没有可用格式，使用默认格式");
                None
            }
        };

        self.session = Some(CaptureSession { active_format });
        self.state = CaptureState::Idle;

        let camera = self.camera.clone();
        let queue = self.queue.clone();
        tokio::spawn(async move {
            let result = camera.start_running().await;
            match queue.upgrade() {
                Some(sender) => {
                    let _ = sender.send(CaptureCommand::SessionStarted { result }).await;
                }
                None => {
                    // 控制器已退出，没有人再负责停止设备
                    if result.is_ok() {
                        camera.stop_running();
                    }
                }
            }
        });
    }

    /// 启动结果回到队列后再处理，与释放会话保持顺序
    fn on_session_started(&mut self, result: Result<(), CameraError>) {
        match result {
            Ok(()) if self.session.is_none() => {
                self.camera.stop_running();
                info!("会话启动前已被释放，停止相机");
            }
            Ok(()) => info!("采集会话已启动"),
            Err(e) => error!("启动采集会话失败: {}", e),
        }
    }

    async fn start_capture(&mut self) {
        if self.session.is_none() {
            warn!("没有活动的采集会话，忽略开始拍摄");
            return;
        }

        if self.state != CaptureState::Capturing {
            self.capture_started = Some(Instant::now());
        }

        // 重新开始时替换旧定时器
        self.timer = Some(CaptureTimer::start(self.config.interval, self.queue.clone()));
        self.state = CaptureState::Capturing;
        self.status.set_capturing(true).await;
        info!("开始定时拍照");
    }

    async fn stop_capture(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        if self.state == CaptureState::Capturing {
            self.accumulate_elapsed();
            self.state = CaptureState::Idle;
            self.status.set_capturing(false).await;
            info!(
                "停止定时拍照，处理中的拍照请求: {}",
                self.pending_captures
            );
        }
    }

    fn on_tick(&mut self) {
        if self.state != CaptureState::Capturing {
            trace!("非拍摄状态，丢弃定时触发");
            return;
        }

        let Some(sender) = self.queue.upgrade() else {
            return;
        };

        self.pending_captures += 1;
        let camera = self.camera.clone();
        tokio::spawn(async move {
            let result = camera.capture_photo().await;
            let _ = sender.send(CaptureCommand::PhotoFinished { result }).await;
        });
    }

    async fn on_photo_finished(&mut self, result: Result<Vec<u8>, CameraError>) {
        self.pending_captures = self.pending_captures.saturating_sub(1);

        match result {
            Ok(data) if !data.is_empty() => {
                let data = Arc::new(data);
                trace!("拍照完成: {} 字节", data.len());
                self.last_image = Some(data.clone());
                self.status.record_capture(Utc::now()).await;
                self.publish(CaptureChange::ImageCaptured(data));
            }
            Ok(_) => {
                let message = "照片数据为空".to_string();
                warn!("{}", message);
                self.status.record_capture_failure(message.clone()).await;
                self.publish(CaptureChange::Error(message));
            }
            Err(e) => {
                error!("拍照失败: {}", e);
                self.status.record_capture_failure(e.to_string()).await;
                self.publish(CaptureChange::Error(e.to_string()));
            }
        }
    }

    async fn set_exposure(&mut self, iso: f32, exposure_duration: f32) {
        if self.session.is_none() {
            let e = CameraError::NoActiveSession;
            warn!("设置曝光失败: {}", e);
            self.publish(CaptureChange::Error(e.to_string()));
            return;
        }

        let duration = exposure_duration_from_secs(exposure_duration as f64);
        match self.camera.set_exposure_custom(iso, duration) {
            Ok(()) => info!(
                "曝光已更新: ISO {:.0}, 快门 {:.6}s",
                iso,
                duration.as_secs_f64()
            ),
            Err(e) => {
                warn!("设置曝光失败: {}", e);
                self.status.set_error(Some(e.to_string())).await;
                self.publish(CaptureChange::Error(e.to_string()));
            }
        }
    }

    fn reset_elapsed(&mut self) {
        self.elapsed = Duration::ZERO;
        if self.capture_started.is_some() {
            self.capture_started = Some(Instant::now());
        }
        debug!("累计拍摄时长已清零");
    }

    async fn teardown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if self.state == CaptureState::Capturing {
            self.accumulate_elapsed();
            self.status.set_capturing(false).await;
        }

        if self.session.take().is_some() {
            self.camera.stop_running();
            info!("采集会话已停止并释放");
        }
        self.state = if self.authorized {
            CaptureState::Idle
        } else {
            CaptureState::Unauthorized
        };
    }

    fn accumulate_elapsed(&mut self) {
        if let Some(started) = self.capture_started.take() {
            self.elapsed += started.elapsed();
        }
    }

    fn current_elapsed(&self) -> Duration {
        self.elapsed
            + self
                .capture_started
                .map(|started| started.elapsed())
                .unwrap_or_default()
    }

    fn idle_or_capturing(&self) -> CaptureState {
        if self.timer.is_some() {
            CaptureState::Capturing
        } else {
            CaptureState::Idle
        }
    }

    fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            state: self.state,
            session_active: self.session.is_some(),
            active_format: self.session.as_ref().and_then(|s| s.active_format),
            elapsed: self.current_elapsed(),
            pending_captures: self.pending_captures,
            interval: self.config.interval,
        }
    }

    fn publish(&self, change: CaptureChange) {
        self.event_bus.publish(AppEvent::Capture(change));
    }
}

/// 捕获控制器Handle
#[derive(Clone)]
pub struct CaptureHandle {
    sender: mpsc::Sender<CaptureCommand>,
}

impl CaptureHandle {
    async fn send(&self, cmd: CaptureCommand) {
        if self.sender.send(cmd).await.is_err() {
            warn!("捕获控制器已停止，命令被丢弃");
        }
    }

    /// 检查授权并初始化会话
    pub async fn setup(&self) {
        self.send(CaptureCommand::Setup).await;
    }

    /// 开始定时拍照
    pub async fn start_capture(&self) {
        self.send(CaptureCommand::StartCapture).await;
    }

    /// 停止定时拍照
    pub async fn stop_capture(&self) {
        self.send(CaptureCommand::StopCapture).await;
    }

    /// 设置曝光（快门时长单位：秒）
    pub async fn set_exposure(&self, iso: f32, exposure_duration: f32) {
        self.send(CaptureCommand::SetExposure {
            iso,
            exposure_duration,
        })
        .await;
    }

    /// 更新拍照间隔
    pub async fn update_interval(&self, interval: Duration) {
        self.send(CaptureCommand::UpdateInterval { interval }).await;
    }

    /// 清零累计拍摄时长
    pub async fn reset_elapsed(&self) {
        self.send(CaptureCommand::ResetElapsed).await;
    }

    /// 曝光范围（无会话时为 None）
    pub async fn exposure_bounds(&self) -> Option<ExposureBounds> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::GetExposureBounds { reply }).await;
        rx.await.ok().flatten()
    }

    /// 最后一张照片
    pub async fn last_image(&self) -> Option<Arc<Vec<u8>>> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::GetLastImage { reply }).await;
        rx.await.ok().flatten()
    }

    /// 状态快照
    pub async fn snapshot(&self) -> Option<CaptureSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::GetSnapshot { reply }).await;
        rx.await.ok()
    }

    /// 累计拍摄时长
    pub async fn elapsed(&self) -> Duration {
        self.snapshot()
            .await
            .map(|snapshot| snapshot.elapsed)
            .unwrap_or_default()
    }

    /// 停止并释放会话
    pub async fn teardown(&self) {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::Teardown { reply }).await;
        let _ = rx.await;
    }

    /// 健康检查：Actor是否还在处理消息
    pub async fn health_check(&self) -> bool {
        self.snapshot().await.is_some()
    }
}

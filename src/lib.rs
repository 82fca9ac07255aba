// 定时拍照相机 - 应用主库

// 声明模块
pub mod actors;
pub mod app;
pub mod camera;
pub mod capture;
pub mod commands;
pub mod domains;
pub mod event_bus;
pub mod gallery;
pub mod logger;
pub mod models;
pub mod settings;
pub mod storage;
pub mod ui;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use actors::{ImageStoreActor, SystemStatusActor};
use camera::CameraDevice;
use capture::{CaptureConfig, CaptureController, CapturePersister};
use domains::{CaptureDomain, StorageDomain, SystemDomain};
use event_bus::EventBus;
use gallery::GalleryController;
use logger::LogBroadcaster;
use settings::SettingsManager;
use storage::{ImageDirectory, StoredImageManager};

pub use app::run;

/// 应用使用的目录
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// 配置文件路径
    pub config_path: PathBuf,
    /// 照片目录
    pub images_dir: PathBuf,
}

impl AppPaths {
    /// 按系统约定的默认目录
    pub fn from_env() -> Self {
        Self {
            config_path: utils::get_app_data_dir().join("config.json"),
            images_dir: utils::get_documents_dir(),
        }
    }
}

/// 应用状态（按领域分组）
///
/// - 捕获领域：负责相机会话和照片持久化
/// - 存储领域：负责图片存储、相册和设置管理
/// - 系统领域：负责系统状态和日志
/// - 事件总线：用于领域间解耦通信
#[derive(Clone)]
pub struct AppState {
    /// 捕获领域管理器
    pub capture_domain: Arc<CaptureDomain>,
    /// 存储领域管理器
    pub storage_domain: Arc<StorageDomain>,
    /// 系统领域管理器
    pub system_domain: Arc<SystemDomain>,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// 初始化 Actor 和各领域管理器
    ///
    /// 设置由调用方加载（相机创建也依赖设置）。
    /// 必须在 tokio 运行时中调用，Actor 在当前运行时中启动
    pub async fn initialize(
        paths: AppPaths,
        settings: Arc<SettingsManager>,
        camera: Arc<dyn CameraDevice>,
        log_broadcaster: Arc<LogBroadcaster>,
    ) -> Result<Self> {
        info!("初始化定时拍照相机...");

        let config = settings.get().await;
        log_broadcaster.set_enabled(config.logger_settings.enable_log_broadcast);

        let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));

        // 启动系统状态 Actor
        let (status_actor, status) = SystemStatusActor::new();
        tokio::spawn(status_actor.run());

        // 准备照片目录并启动图片存储 Actor
        let directory = ImageDirectory::new(paths.images_dir.clone(), config.image_extension.clone());
        directory.ensure_exists().await?;
        info!("照片目录: {:?}", directory.root());

        let (store_actor, image_store) =
            ImageStoreActor::new(StoredImageManager::new(directory.clone()));
        tokio::spawn(store_actor.run());
        if let Err(e) = image_store.load().await {
            warn!("初始加载照片列表失败: {}", e);
        }

        // 启动捕获控制器
        let capture_config = CaptureConfig {
            interval: Duration::from_millis(config.capture_interval_ms),
            target_pixels: config.target_resolution.pixel_count(),
        };
        let (controller, capture) =
            CaptureController::new(camera.clone(), event_bus.clone(), status.clone(), capture_config);
        tokio::spawn(controller.run());

        // 持久化任务在任何拍照之前完成订阅
        let persister = CapturePersister::spawn(event_bus.clone(), directory, status.clone());

        let gallery = Arc::new(GalleryController::new(
            image_store.clone(),
            capture.clone(),
            status.clone(),
            event_bus.clone(),
        ));

        let state = AppState {
            capture_domain: Arc::new(CaptureDomain::new(camera, capture, persister)),
            storage_domain: Arc::new(StorageDomain::new(image_store, gallery, settings)),
            system_domain: Arc::new(SystemDomain::new(status, log_broadcaster)),
            event_bus,
        };

        info!("领域管理器已初始化完成");
        Ok(state)
    }

    /// 停止拍照、释放相机并停止后台任务
    pub async fn shutdown(&self) {
        self.capture_domain.get_capture_handle().teardown().await;
        self.capture_domain.stop_persister().await;
        info!("应用已关闭");
    }
}

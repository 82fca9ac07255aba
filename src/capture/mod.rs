// 拍摄模块 - 相机会话控制、定时拍照和照片持久化

pub mod controller;
pub mod persister;
pub mod scheduler;

pub use controller::{CaptureCommand, CaptureConfig, CaptureController, CaptureHandle, CaptureSnapshot};
pub use persister::CapturePersister;
pub use scheduler::CaptureTimer;

//! 命令模块
//!
//! 提供界面调用的所有命令接口，按功能分组：
//! - config: 配置管理命令
//! - control: 相机控制命令
//! - gallery: 相册管理命令

pub mod config;
pub mod control;
pub mod gallery;

// 重新导出所有命令
pub use config::*;
pub use control::*;
pub use gallery::*;

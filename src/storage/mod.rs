// 存储模块 - 本地图片文件存储

// 子模块
pub mod directory;
pub mod image_manager;

// 重新导出主要类型
pub use directory::ImageDirectory;
pub use image_manager::{DeletionFailure, DeletionReport, StoredImageManager};

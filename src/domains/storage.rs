// 存储领域管理器
//
// 负责图片存储、相册和设置管理相关的功能
// 包含 ImageStoreHandle、GalleryController 和 SettingsManager 三个核心组件

use std::sync::Arc;
use crate::actors::ImageStoreHandle;
use crate::gallery::GalleryController;
use crate::settings::SettingsManager;

/// 存储领域管理器 - 负责图片存储、相册和设置
#[derive(Clone)]
pub struct StorageDomain {
    image_store: ImageStoreHandle,
    gallery: Arc<GalleryController>,
    settings: Arc<SettingsManager>,
}

impl StorageDomain {
    /// 创建新的存储领域管理器
    pub fn new(
        image_store: ImageStoreHandle,
        gallery: Arc<GalleryController>,
        settings: Arc<SettingsManager>,
    ) -> Self {
        Self { image_store, gallery, settings }
    }

    /// 获取图片存储 Handle
    pub fn get_image_store(&self) -> &ImageStoreHandle {
        &self.image_store
    }

    /// 获取相册控制器
    pub fn get_gallery(&self) -> &Arc<GalleryController> {
        &self.gallery
    }

    /// 获取设置管理器
    pub fn get_settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }
}

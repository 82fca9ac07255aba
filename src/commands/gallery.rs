//! 相册命令
//!
//! 提供相册浏览和管理接口，包括：
//! - 列表加载
//! - 批量删除
//! - 完成拍摄会话
//! - 统计信息

use std::path::PathBuf;

use crate::models::GalleryInfo;
use crate::storage::DeletionReport;
use crate::utils::validate_indices;
use crate::AppState;
use tracing::info;

/// 重新加载相册，返回图片列表
pub async fn load_gallery(state: &AppState) -> Result<Vec<PathBuf>, String> {
    let gallery = state.storage_domain.get_gallery();
    gallery.load_images().await?;
    Ok(gallery.image_paths().await)
}

/// 删除选中的图片
///
/// 部分失败时返回结果中包含失败条目，失败的图片保留在列表中
pub async fn delete_gallery_images(
    state: &AppState,
    indices: Vec<usize>,
) -> Result<DeletionReport, String> {
    validate_indices(&indices)?;

    let report = state.storage_domain.get_gallery().delete_images(&indices).await;
    if report.removed.is_empty() && !report.is_success() {
        let message = report
            .failures
            .first()
            .map(|failure| failure.error.clone())
            .unwrap_or_default();
        return Err(format!("删除图片失败: {}", message));
    }

    Ok(report)
}

/// 完成拍摄：删除全部图片并清零拍摄时长
pub async fn complete_gallery_session(state: &AppState) -> Result<(), String> {
    info!("完成拍摄会话");
    state.storage_domain.get_gallery().complete_session().await
}

/// 获取相册统计信息
pub async fn get_gallery_info(state: &AppState) -> Result<GalleryInfo, String> {
    Ok(state.storage_domain.get_gallery().gallery_info().await)
}

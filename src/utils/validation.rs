//! 输入验证工具函数
//!
//! 命令层参数在进入控制器之前先做基本检查

/// 验证曝光参数（ISO 与快门时长必须是正的有限值）
///
/// 设备范围检查由相机完成，这里只拦截明显无效的输入
pub fn validate_exposure(iso: f32, exposure_duration: f32) -> Result<(), String> {
    if !iso.is_finite() || iso <= 0.0 {
        return Err(format!("无效的 ISO: {}", iso));
    }
    if !exposure_duration.is_finite() || exposure_duration <= 0.0 {
        return Err(format!("无效的快门时长: {}", exposure_duration));
    }
    Ok(())
}

/// 验证待删除的下标列表
///
/// # 返回
/// - `Ok(())`: 验证通过
/// - `Err(String)`: 列表为空
pub fn validate_indices(indices: &[usize]) -> Result<(), String> {
    if indices.is_empty() {
        return Err("没有选择要删除的图片".to_string());
    }
    Ok(())
}

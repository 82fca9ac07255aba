//! 文件系统路径工具
//!
//! 提供跨平台的应用数据目录、照片目录和日志目录

use std::path::PathBuf;

/// 应用目录名
pub const APP_DIR_NAME: &str = "camera-app";

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

/// 获取应用数据目录（配置文件所在位置）
///
/// - macOS: ~/Library/Application Support/camera-app
/// - Windows: %APPDATA%/camera-app
/// - Linux: ~/.local/share/camera-app
pub fn get_app_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support").join(APP_DIR_NAME)
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR_NAME)
    } else {
        home_dir().join(".local/share").join(APP_DIR_NAME)
    }
}

/// 获取照片目录（应用的文档目录）
///
/// - macOS / Linux: ~/Documents/camera-app
/// - Windows: %USERPROFILE%/Documents/camera-app
pub fn get_documents_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()))
    } else {
        home_dir()
    };
    base.join("Documents").join(APP_DIR_NAME)
}

/// 获取日志目录路径（跨平台）
///
/// - macOS: ~/Library/Logs/camera-app
/// - Windows: %APPDATA%/camera-app/logs
/// - Linux: ~/.local/share/camera-app/logs
pub fn get_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        home_dir().join("Library/Logs").join(APP_DIR_NAME)
    } else {
        get_app_data_dir().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(get_app_data_dir().ends_with(APP_DIR_NAME));
        assert!(get_documents_dir().ends_with(APP_DIR_NAME));
        assert!(get_log_dir()
            .components()
            .any(|c| c.as_os_str() == APP_DIR_NAME));
    }
}

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tokio::sync::RwLock;

use crate::models::{AppConfig, PersistedAppConfig};

/// 最小拍照间隔（毫秒）
const MIN_CAPTURE_INTERVAL_MS: u64 = 50;

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedAppConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedAppConfig>(&bytes).unwrap_or_default()
            }
            _ => {
                let default = PersistedAppConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub async fn get(&self) -> PersistedAppConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: AppConfig) -> Result<PersistedAppConfig> {
        let mut config = self.data.write().await;

        if let Some(interval) = update.capture_interval_ms {
            if interval < MIN_CAPTURE_INTERVAL_MS {
                return Err(anyhow!(
                    "拍照间隔不能小于{}毫秒",
                    MIN_CAPTURE_INTERVAL_MS
                ));
            }
            config.capture_interval_ms = interval;
        }
        if let Some(resolution) = update.target_resolution {
            if resolution.pixel_count() == 0 {
                return Err(anyhow!("目标分辨率无效"));
            }
            config.target_resolution = resolution;
        }
        if let Some(quality) = update.jpeg_quality {
            config.jpeg_quality = quality.clamp(1, 100);
        }
        if let Some(logger) = update.logger_settings {
            config.logger_settings = logger;
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedAppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetResolution;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_defaults_written_when_missing() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let settings = SettingsManager::new(path.clone()).await.unwrap();
        assert_eq!(settings.get().await.capture_interval_ms, 200);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let settings = SettingsManager::new(path.clone()).await.unwrap();
        settings
            .update(AppConfig {
                capture_interval_ms: Some(500),
                target_resolution: Some(TargetResolution {
                    width: 1920,
                    height: 1080,
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        let reloaded = SettingsManager::new(path).await.unwrap().get().await;
        assert_eq!(reloaded.capture_interval_ms, 500);
        assert_eq!(reloaded.target_resolution.width, 1920);
    }

    #[tokio::test]
    async fn test_update_rejects_too_short_interval() {
        let temp_dir = tempdir().unwrap();
        let settings = SettingsManager::new(temp_dir.path().join("config.json"))
            .await
            .unwrap();

        let result = settings
            .update(AppConfig {
                capture_interval_ms: Some(10),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(settings.get().await.capture_interval_ms, 200);
    }
}

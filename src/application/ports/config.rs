//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration; a missing file yields an empty config
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write the defaults to a new file. Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Defaults, overlaid by the stored file, overlaid by `overrides`.
    ///
    /// An unreadable or malformed file is logged and skipped.
    async fn layered(&self, overrides: AppConfig) -> AppConfig {
        let stored = self.load().await.unwrap_or_else(|e| {
            log::warn!("Ignoring config file {}: {}", self.path().display(), e);
            AppConfig::empty()
        });
        AppConfig::defaults().merge(stored).merge(overrides)
    }
}

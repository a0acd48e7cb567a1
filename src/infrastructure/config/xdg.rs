//! XDG config store adapter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Directory name under the user config dir
pub const APP_DIR_NAME: &str = "simple-audio-record";

/// XDG-compliant config store
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    /// Store at `$XDG_CONFIG_HOME/simple-audio-record/config.toml`
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR_NAME);

        Self {
            path: config_dir.join("config.toml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            return Ok(AppConfig::empty());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::parse_toml(&content)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content = Self::to_toml(config)?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        self.save(&AppConfig::defaults()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_xdg() {
        let store = XdgConfigStore::new();
        let path = store.path();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn parse_toml_flat_format() {
        let content = r#"
output_path = "/tmp/take.wav"
level_ceiling = 0.5
gain = 2
bluetooth_hq = true
input_device = "USB Mic"
"#;

        let config = XdgConfigStore::parse_toml(content).unwrap();
        assert_eq!(config.output_path, Some(PathBuf::from("/tmp/take.wav")));
        assert_eq!(config.level_ceiling, Some(0.5));
        assert_eq!(config.gain, Some(2.0));
        assert_eq!(config.bluetooth_hq, Some(true));
        assert_eq!(config.input_device.as_deref(), Some("USB Mic"));
    }

    #[test]
    fn parse_toml_rejects_wrong_types() {
        assert!(XdgConfigStore::parse_toml("debounce_ms = \"fast\"").is_err());
    }

    #[tokio::test]
    async fn init_then_load_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("cfg/config.toml"));

        store.init().await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, AppConfig::defaults());

        let err = store.init().await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        assert_eq!(store.load().await.unwrap(), AppConfig::empty());
    }

    #[tokio::test]
    async fn layered_puts_overrides_on_top() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        store
            .save(&AppConfig {
                gain: Some(5.0),
                input_device: Some("Built-in".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let merged = store
            .layered(AppConfig {
                input_device: Some("USB Mic".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(merged.gain, Some(5.0));
        assert_eq!(merged.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(merged.debounce_ms, AppConfig::defaults().debounce_ms);
    }

    #[tokio::test]
    async fn layered_skips_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gain = \"loud\"").unwrap();

        let merged = XdgConfigStore::with_path(&path).layered(AppConfig::empty()).await;
        assert_eq!(merged, AppConfig::defaults());
    }
}

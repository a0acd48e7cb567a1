//! Application configuration value object

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::audio::LevelSettings;
use crate::domain::audio::level::{
    DEFAULT_GAIN, DEFAULT_LEVEL_CEILING, DEFAULT_LEVEL_FLOOR, DEFAULT_SILENCE_THRESHOLD,
};

/// File name of the recording inside the temp directory
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "simple.wav";

/// Interval between published meter updates
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Pause between teardown and restart on a route change
pub const DEFAULT_ROUTE_RESTART_DELAY_MS: u64 = 500;

/// Default recording path: `<temp dir>/simple.wav`
pub fn default_output_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_OUTPUT_FILE_NAME)
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_path: Option<PathBuf>,
    pub level_floor: Option<f32>,
    pub level_ceiling: Option<f32>,
    pub gain: Option<f32>,
    pub debounce_ms: Option<u64>,
    pub route_restart_delay_ms: Option<u64>,
    pub bluetooth_hq: Option<bool>,
    pub input_device: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            output_path: Some(default_output_path()),
            level_floor: Some(DEFAULT_LEVEL_FLOOR),
            level_ceiling: Some(DEFAULT_LEVEL_CEILING),
            gain: Some(DEFAULT_GAIN),
            debounce_ms: Some(DEFAULT_DEBOUNCE_MS),
            route_restart_delay_ms: Some(DEFAULT_ROUTE_RESTART_DELAY_MS),
            bluetooth_hq: Some(false),
            input_device: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_path: other.output_path.or(self.output_path),
            level_floor: other.level_floor.or(self.level_floor),
            level_ceiling: other.level_ceiling.or(self.level_ceiling),
            gain: other.gain.or(self.gain),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            route_restart_delay_ms: other.route_restart_delay_ms.or(self.route_restart_delay_ms),
            bluetooth_hq: other.bluetooth_hq.or(self.bluetooth_hq),
            input_device: other.input_device.or(self.input_device),
        }
    }

    pub fn output_path_or_default(&self) -> PathBuf {
        self.output_path.clone().unwrap_or_else(default_output_path)
    }

    /// Meter settings assembled from the individual fields
    pub fn level_settings(&self) -> LevelSettings {
        LevelSettings {
            floor: self.level_floor.unwrap_or(DEFAULT_LEVEL_FLOOR),
            ceiling: self.level_ceiling.unwrap_or(DEFAULT_LEVEL_CEILING),
            gain: self.gain.unwrap_or(DEFAULT_GAIN),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }

    pub fn debounce_or_default(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS).max(1))
    }

    pub fn route_restart_delay_or_default(&self) -> Duration {
        Duration::from_millis(
            self.route_restart_delay_ms
                .unwrap_or(DEFAULT_ROUTE_RESTART_DELAY_MS),
        )
    }

    pub fn bluetooth_hq_or_default(&self) -> bool {
        self.bluetooth_hq.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.level_floor, Some(0.0));
        assert_eq!(config.level_ceiling, Some(0.3));
        assert_eq!(config.gain, Some(3.0));
        assert_eq!(config.debounce_ms, Some(100));
        assert_eq!(config.bluetooth_hq, Some(false));
        assert!(config.input_device.is_none());
        let path = config.output_path_or_default();
        assert!(path.ends_with("simple.wav"));
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.output_path.is_none());
        assert!(config.gain.is_none());
        assert!(config.bluetooth_hq.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            gain: Some(3.0),
            debounce_ms: Some(100),
            input_device: Some("Built-in".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            gain: Some(5.0),
            debounce_ms: None,
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.gain, Some(5.0));
        assert_eq!(merged.debounce_ms, Some(100));
        assert_eq!(merged.input_device.as_deref(), Some("Built-in"));
    }

    #[test]
    fn level_settings_from_fields() {
        let config = AppConfig {
            level_ceiling: Some(0.5),
            gain: Some(2.0),
            ..Default::default()
        };
        let settings = config.level_settings();
        assert_eq!(settings.floor, 0.0);
        assert_eq!(settings.ceiling, 0.5);
        assert_eq!(settings.gain, 2.0);
    }

    #[test]
    fn durations_fall_back_to_defaults() {
        let config = AppConfig::empty();
        assert_eq!(config.debounce_or_default(), Duration::from_millis(100));
        assert_eq!(
            config.route_restart_delay_or_default(),
            Duration::from_millis(500)
        );
        assert!(!config.bluetooth_hq_or_default());
    }

    #[test]
    fn zero_debounce_is_bumped() {
        let config = AppConfig {
            debounce_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(config.debounce_or_default(), Duration::from_millis(1));
    }
}

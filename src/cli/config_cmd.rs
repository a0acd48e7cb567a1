//! Config command handler

use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    // Floor/ceiling/gain only make sense together
    AppConfig::defaults()
        .merge(config.clone())
        .level_settings()
        .validate()?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match display_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Parse `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "output_path" => {
            if value.trim().is_empty() {
                return Err(validation(key, "Path must not be empty"));
            }
            config.output_path = Some(PathBuf::from(value));
        }
        "level_floor" => config.level_floor = Some(parse_level(key, value)?),
        "level_ceiling" => config.level_ceiling = Some(parse_level(key, value)?),
        "gain" => {
            let gain = parse_float(key, value)?;
            if gain <= 0.0 {
                return Err(validation(key, "Gain must be a positive number"));
            }
            config.gain = Some(gain);
        }
        "debounce_ms" => {
            let ms = parse_millis(key, value)?;
            if ms == 0 {
                return Err(validation(key, "Interval must be at least 1 ms"));
            }
            config.debounce_ms = Some(ms);
        }
        "route_restart_delay_ms" => config.route_restart_delay_ms = Some(parse_millis(key, value)?),
        "bluetooth_hq" => {
            config.bluetooth_hq = Some(
                parse_bool(value)
                    .map_err(|_| validation(key, "Value must be 'true' or 'false'"))?,
            )
        }
        "input_device" => config.input_device = Some(value.to_string()),
        _ => return Err(validation(key, "Unknown key")),
    }
    Ok(())
}

fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "output_path" => config
            .output_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        "level_floor" => config.level_floor.map(|v| v.to_string()),
        "level_ceiling" => config.level_ceiling.map(|v| v.to_string()),
        "gain" => config.gain.map(|v| v.to_string()),
        "debounce_ms" => config.debounce_ms.map(|v| v.to_string()),
        "route_restart_delay_ms" => config.route_restart_delay_ms.map(|v| v.to_string()),
        "bluetooth_hq" => config.bluetooth_hq.map(|b| b.to_string()),
        "input_device" => config.input_device.clone(),
        _ => None,
    }
}

fn validation(key: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_float(key: &str, value: &str) -> Result<f32, ConfigError> {
    match value.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(validation(key, "Value must be a number")),
    }
}

/// RMS levels live in [0, 1]
fn parse_level(key: &str, value: &str) -> Result<f32, ConfigError> {
    let level = parse_float(key, value)?;
    if !(0.0..=1.0).contains(&level) {
        return Err(validation(key, "Value must be between 0 and 1"));
    }
    Ok(level)
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| validation(key, "Value must be a whole number of milliseconds"))
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

//! App runners for the record, play and devices commands

use std::future;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

use crate::application::ports::{ConfigStore, InputDevice, InputPreferences};
use crate::application::{LevelPublisher, PlaybackController, SessionController};
use crate::domain::audio::AudioFormat;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::infrastructure::{
    CpalInput, CpalRouteWatcher, RecordingInfo, RodioPlayer, RubatoConverter, WavFileStore,
    XdgConfigStore,
};

use super::args::RecordArgs;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How often the meter line refreshes when no new level arrives
const METER_REFRESH: Duration = Duration::from_millis(250);

type Recorder = SessionController<CpalInput, RubatoConverter, WavFileStore>;

/// Load and merge configuration: defaults < file < cli
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    XdgConfigStore::new().layered(cli_config).await
}

/// Config layer built from `record` flags
pub fn record_cli_config(args: &RecordArgs) -> AppConfig {
    AppConfig {
        output_path: args.output.clone(),
        bluetooth_hq: if args.bluetooth_hq { Some(true) } else { None },
        input_device: args.device.clone(),
        ..Default::default()
    }
}

/// Reject configs the recorder cannot run with
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    config.level_settings().validate()
}

/// Record until Ctrl+C or the optional time limit
pub async fn run_record(args: RecordArgs) -> ExitCode {
    let mut presenter = Presenter::new();

    let config = load_merged_config(record_cli_config(&args)).await;
    if let Err(e) = validate_config(&config) {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let levels = Arc::new(LevelPublisher::new(config.level_settings()));
    let ticker = levels.spawn(config.debounce_or_default());

    let preferences = InputPreferences {
        device_name: config.input_device.clone(),
        high_quality: config.bluetooth_hq_or_default(),
    };
    let controller: Arc<Recorder> = Arc::new(SessionController::new(
        CpalInput::new(),
        RubatoConverter::new(AudioFormat::TARGET),
        WavFileStore::new(config.output_path_or_default()),
        levels,
        preferences,
        config.route_restart_delay_or_default(),
    ));
    let route_task = controller.watch_routes(&CpalRouteWatcher::new());

    let code = record_session(&controller, &shutdown, args.seconds, &mut presenter).await;

    route_task.abort();
    ticker.abort();
    code
}

async fn record_session(
    controller: &Recorder,
    shutdown: &ShutdownSignal,
    seconds: Option<u64>,
    presenter: &mut Presenter,
) -> ExitCode {
    if let Err(e) = controller.start_recording().await {
        presenter.error(&format!("Failed to start recording: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    if let Some(route) = controller.active_route().await {
        presenter.info(&format!("Input: {} ({})", route.device_name, route.format));
    }

    let started = Instant::now();
    let deadline = seconds.and_then(|s| started.checked_add(Duration::from_secs(s)));
    let mut levels = controller.levels();
    let mut refresh = interval(METER_REFRESH);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    presenter.show_level_meter();
    let mut ended_early = false;
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = wait_until(deadline) => break,
            changed = levels.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = *levels.borrow_and_update();
                presenter.update_level_meter(reading, started.elapsed());
            }
            _ = refresh.tick() => {
                if !controller.is_active() {
                    ended_early = true;
                    break;
                }
                let reading = *levels.borrow();
                presenter.update_level_meter(reading, started.elapsed());
            }
        }
    }

    let stopped = controller.stop_recording().await;
    if ended_early {
        presenter.spinner_fail("Recording interrupted");
    } else {
        presenter.spinner_success("Recording stopped");
    }

    if let Err(e) = stopped {
        presenter.error(&format!("Failed to stop recording: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    report_recording(presenter, &controller.output_path().await, controller.frames_written().await);
    if let Some(e) = controller.last_error() {
        presenter.warn(&format!("Last error: {}", e));
    }

    if ended_early {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Resolve at the deadline, never without one
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

fn report_recording(presenter: &Presenter, path: &Path, frames: u64) {
    match RecordingInfo::read(path) {
        Ok(info) => presenter.success(&format!(
            "Saved {} ({}, {:.1}s, {} frames)",
            path.display(),
            info.format,
            info.duration().as_secs_f64(),
            frames
        )),
        Err(e) => {
            log::debug!("Could not read back {}: {}", path.display(), e);
            presenter.success(&format!("Saved {} ({} frames)", path.display(), frames));
        }
    }
    presenter.output(&path.to_string_lossy());
}

/// Play the recording and wait for it to finish
pub async fn run_play(output: Option<std::path::PathBuf>) -> ExitCode {
    let mut presenter = Presenter::new();
    let config = load_merged_config(AppConfig {
        output_path: output,
        ..Default::default()
    })
    .await;

    let controller = PlaybackController::new(RodioPlayer::new(), config.output_path_or_default());
    if !controller.path().exists() {
        presenter.info(&format!(
            "No recording at {}. Run 'simple-audio-record record' first.",
            controller.path().display()
        ));
        return ExitCode::from(EXIT_SUCCESS);
    }

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = controller.play().await {
        presenter.error(&format!("Playback failed: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.start_spinner(&format!("Playing {}", controller.path().display()));
    let interrupted = tokio::select! {
        _ = controller.wait() => false,
        _ = shutdown.wait() => true,
    };

    if interrupted {
        if let Err(e) = controller.stop().await {
            presenter.spinner_fail(&format!("Failed to stop playback: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
        presenter.spinner_success("Playback stopped");
    } else {
        presenter.spinner_success("Playback finished");
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// List input devices, marking the default
pub fn run_devices() -> ExitCode {
    let presenter = Presenter::new();
    match CpalInput::new().list_inputs() {
        Ok(inputs) if inputs.is_empty() => {
            presenter.warn("No input devices found");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(inputs) => {
            for input in inputs {
                let marker = if input.is_default { "*" } else { " " };
                presenter.output(&format!("{} {}", marker, input.name));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn record_flags_only_set_what_was_given() {
        let config = record_cli_config(&RecordArgs::default());
        assert_eq!(config, AppConfig::empty());

        let config = record_cli_config(&RecordArgs {
            seconds: Some(3),
            device: Some("USB Mic".to_string()),
            bluetooth_hq: true,
            output: Some(PathBuf::from("/tmp/take.wav")),
        });
        assert_eq!(config.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(config.bluetooth_hq, Some(true));
        assert_eq!(config.output_path, Some(PathBuf::from("/tmp/take.wav")));
    }

    #[test]
    fn cli_flags_override_file() {
        let file = AppConfig {
            bluetooth_hq: Some(true),
            input_device: Some("Built-in".to_string()),
            ..Default::default()
        };
        let cli = record_cli_config(&RecordArgs {
            device: Some("USB Mic".to_string()),
            ..Default::default()
        });

        let merged = AppConfig::defaults().merge(file).merge(cli);
        assert_eq!(merged.input_device.as_deref(), Some("USB Mic"));
        assert!(merged.bluetooth_hq_or_default());
    }

    #[test]
    fn inverted_level_range_is_rejected() {
        let config = AppConfig {
            level_floor: Some(0.5),
            level_ceiling: Some(0.2),
            ..AppConfig::defaults()
        };
        assert!(validate_config(&config).is_err());
        assert!(validate_config(&AppConfig::defaults()).is_ok());
    }

    #[tokio::test]
    async fn wait_until_without_deadline_never_fires() {
        let result =
            tokio::time::timeout(Duration::from_millis(20), wait_until(None)).await;
        assert!(result.is_err());
    }
}

//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

/// Simple Audio Record - record the microphone to a WAV file and play it back
#[derive(Parser, Debug)]
#[command(name = "simple-audio-record")]
#[command(version)]
#[command(about = "Record the microphone to a 16-bit mono WAV file with a live level meter")]
#[command(long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level for this crate's modules
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Initialize logging. `RUST_LOG` overrides the verbosity flags.
pub fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();

    // Keep dependencies quiet unless asked for
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("simple_audio_record", cli.log_level());
    builder.parse_default_env();

    builder.format_timestamp_millis().init();
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record from the current input until Ctrl+C (or --seconds)
    Record(RecordArgs),
    /// Play the recorded file
    Play {
        /// Recording to play (defaults to the configured output path)
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List input devices
    Devices,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Longest time limit `record --seconds` accepts (one day)
pub const MAX_RECORD_SECONDS: u64 = 86_400;

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RecordArgs {
    /// Stop automatically after this many seconds
    #[arg(
        short = 's',
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..=MAX_RECORD_SECONDS)
    )]
    pub seconds: Option<u64>,

    /// Input device name (defaults to the system default input)
    #[arg(short = 'd', long, value_name = "NAME")]
    pub device: Option<String>,

    /// Prefer the device's highest-quality capture format
    #[arg(long)]
    pub bluetooth_hq: bool,

    /// Output WAV file
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_path",
    "level_floor",
    "level_ceiling",
    "gain",
    "debounce_ms",
    "route_restart_delay_ms",
    "bluetooth_hq",
    "input_device",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_record_defaults() {
        let cli = Cli::parse_from(["simple-audio-record", "record"]);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert!(args.seconds.is_none());
        assert!(args.device.is_none());
        assert!(!args.bluetooth_hq);
        assert!(args.output.is_none());
    }

    #[test]
    fn cli_parses_record_options() {
        let cli = Cli::parse_from([
            "simple-audio-record",
            "record",
            "-s",
            "5",
            "--device",
            "USB Mic",
            "--bluetooth-hq",
            "-o",
            "/tmp/take.wav",
        ]);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert_eq!(args.seconds, Some(5));
        assert_eq!(args.device.as_deref(), Some("USB Mic"));
        assert!(args.bluetooth_hq);
        assert_eq!(args.output, Some(PathBuf::from("/tmp/take.wav")));
    }

    #[test]
    fn cli_parses_play_output() {
        let cli = Cli::parse_from(["simple-audio-record", "play", "--output", "a.wav"]);
        assert!(matches!(
            cli.command,
            Commands::Play { output: Some(ref p) } if p == &PathBuf::from("a.wav")
        ));
    }

    #[test]
    fn cli_rejects_non_numeric_seconds() {
        let result = Cli::try_parse_from(["simple-audio-record", "record", "-s", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_bounds_seconds() {
        for value in ["0", "86401", "18446744073709551615"] {
            let result = Cli::try_parse_from(["simple-audio-record", "record", "-s", value]);
            assert!(result.is_err(), "accepted {}", value);
        }
        let cli = Cli::parse_from(["simple-audio-record", "record", "-s", "86400"]);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert_eq!(args.seconds, Some(MAX_RECORD_SECONDS));
    }

    #[test]
    fn verbosity_maps_to_log_level() {
        let cli = Cli::parse_from(["simple-audio-record", "devices"]);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
        let cli = Cli::parse_from(["simple-audio-record", "-vv", "devices"]);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        let cli = Cli::parse_from(["simple-audio-record", "record", "-vvvv"]);
        assert_eq!(cli.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["simple-audio-record"]).is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["simple-audio-record", "config", "set", "gain", "2.5"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "gain");
            assert_eq!(value, "2.5");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("output_path"));
        assert!(is_valid_config_key("bluetooth_hq"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}

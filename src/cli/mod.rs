//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_devices, run_play, run_record, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{init_logging, Cli, Commands, ConfigAction, RecordArgs};
pub use presenter::Presenter;

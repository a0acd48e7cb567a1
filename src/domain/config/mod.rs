//! Configuration value objects

pub mod app_config;

pub use app_config::{default_output_path, AppConfig};

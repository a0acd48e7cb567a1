//! Domain layer - Core recording logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod error;
pub mod session;

// Re-export common types
pub use audio::{AudioBuffer, AudioFormat, LevelReading, LevelSettings, RouteChange};
pub use config::AppConfig;
pub use error::*;
pub use session::{RecorderSession, SessionState};

//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder and player operations and the trait
//! definitions for external system interactions.

pub mod capture_pipeline;
pub mod error;
pub mod level_publisher;
pub mod playback;
pub mod ports;
pub mod session_controller;

// Re-export use cases
pub use capture_pipeline::CapturePipeline;
pub use error::{LastError, RecorderError};
pub use level_publisher::LevelPublisher;
pub use playback::PlaybackController;
pub use session_controller::SessionController;

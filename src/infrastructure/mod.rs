//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, rubato, hound, rodio and the filesystem.

pub mod config;
pub mod playback;
pub mod recording;
pub mod route;

// Re-export adapters
pub use config::XdgConfigStore;
pub use playback::RodioPlayer;
pub use recording::{CpalInput, RecordingInfo, RubatoConverter, WavFileStore};
pub use route::CpalRouteWatcher;

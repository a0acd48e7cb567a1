//! Playback port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Audio output not available: {0}")]
    DeviceNotAvailable(String),

    #[error("Failed to open recording: {0}")]
    OpenFailed(String),

    #[error("Failed to decode recording: {0}")]
    DecodeFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played to the end of the file
    Completed,
    /// Stopped on request
    Stopped,
}

/// Called once when playback ends
pub type FinishCallback = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// Port for audio file playback
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Open, decode and start playing a file.
    ///
    /// Returns once playback has started; `on_finished` fires when it ends.
    async fn play(&self, path: &Path, on_finished: FinishCallback) -> Result<(), PlaybackError>;

    /// Stop the current playback, if any.
    ///
    /// The stopped playback's finish callback has run when this returns.
    async fn stop(&self) -> Result<(), PlaybackError>;
}

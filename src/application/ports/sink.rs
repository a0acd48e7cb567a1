//! Recording output port interfaces

use std::path::Path;

use thiserror::Error;

use crate::domain::audio::AudioFormat;

/// Output file errors
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Failed to remove previous recording: {0}")]
    RemoveFailed(String),

    #[error("Failed to create recording file: {0}")]
    CreateFailed(String),

    #[error("Failed to write audio: {0}")]
    WriteFailed(String),

    #[error("Failed to finalize recording file: {0}")]
    FinalizeFailed(String),
}

/// An open output file receiving converted samples
pub trait SampleSink: Send {
    /// Append samples in the sink's format
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError>;

    /// Flush headers and close the file
    fn finish(self: Box<Self>) -> Result<(), SinkError>;
}

/// Port for the single recording location
pub trait RecordingStore: Send + Sync {
    /// Delete any previous recording and open a fresh one
    fn create(&self, format: AudioFormat) -> Result<Box<dyn SampleSink>, SinkError>;

    /// Where the recording lives
    fn path(&self) -> &Path;

    fn exists(&self) -> bool {
        self.path().exists()
    }
}

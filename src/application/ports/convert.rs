//! Sample format conversion port

use thiserror::Error;

use crate::domain::audio::{AudioBuffer, AudioFormat};

/// Conversion errors
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Conversion failed: {0}")]
    Failed(String),
}

/// Converts tap buffers into the target format.
///
/// Implementations may keep state between buffers (resampler history,
/// leftover frames), so one converter serves one stream at a time.
pub trait SampleConverter: Send {
    /// Format the converter produces
    fn target(&self) -> AudioFormat;

    /// Convert one buffer, appending target samples to `output`.
    ///
    /// Returns the number of frames appended.
    fn convert(
        &mut self,
        input: &AudioBuffer<'_>,
        output: &mut Vec<i16>,
    ) -> Result<usize, ConversionError>;

    /// Push out frames still held back once the stream has ended.
    ///
    /// Returns the number of frames appended. The converter is ready for a
    /// new stream afterwards.
    fn flush(&mut self, _output: &mut Vec<i16>) -> Result<usize, ConversionError> {
        Ok(0)
    }

    /// Drop any carried state before a new stream starts
    fn reset(&mut self);
}

//! Recording infrastructure module
//!
//! cpal input, rubato conversion to mono 16-bit 44.1kHz and hound WAV output.

mod cpal_input;
mod rubato_converter;
mod wav_store;

pub use cpal_input::{CpalCaptureStream, CpalInput};
pub use rubato_converter::RubatoConverter;
pub use wav_store::{RecordingInfo, WavFileSink, WavFileStore};

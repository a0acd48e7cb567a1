//! Audio domain: formats, buffers, level metering and input routes

pub mod format;
pub mod level;
pub mod route;

pub use format::{
    output_frame_capacity, AudioBuffer, AudioFormat, TARGET_BITS_PER_SAMPLE, TARGET_SAMPLE_RATE,
};
pub use level::{rms, LevelReading, LevelSettings};
pub use route::{RouteChange, RouteChangeReason, RouteSnapshot};

//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod convert;
pub mod player;
pub mod route;
pub mod sink;

// Re-export common types
pub use capture::{
    BufferCallback, CaptureError, CaptureStream, InputDevice, InputInfo, InputPreferences,
    InputRoute, StreamErrorCallback, TapCallbacks,
};
pub use config::ConfigStore;
pub use convert::{ConversionError, SampleConverter};
pub use player::{AudioPlayer, FinishCallback, PlaybackError, PlaybackOutcome};
pub use route::RouteMonitor;
pub use sink::{RecordingStore, SampleSink, SinkError};

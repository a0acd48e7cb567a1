//! Audio input port interfaces

use thiserror::Error;

use crate::domain::audio::{AudioBuffer, AudioFormat};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to activate audio session: {0}")]
    ActivationFailed(String),

    #[error("Failed to install input tap: {0}")]
    TapFailed(String),

    #[error("Audio stream error: {0}")]
    StreamFailed(String),
}

/// How the session should pick its input route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputPreferences {
    /// Device to use instead of the system default
    pub device_name: Option<String>,
    /// Prefer the highest sample rate the route supports (Bluetooth HQ)
    pub high_quality: bool,
}

/// The input route resolved when the session is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRoute {
    pub device_name: String,
    /// Native format the tap will deliver
    pub format: AudioFormat,
}

/// An input device as listed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputInfo {
    pub name: String,
    pub is_default: bool,
}

/// Called on the audio thread for every delivered buffer
pub type BufferCallback = Box<dyn FnMut(AudioBuffer<'_>) + Send + 'static>;

/// Called on the audio thread when the stream reports an error
pub type StreamErrorCallback = Box<dyn FnMut(CaptureError) + Send + 'static>;

/// Callbacks handed to the device when a tap is installed
pub struct TapCallbacks {
    pub on_buffer: BufferCallback,
    pub on_error: StreamErrorCallback,
}

/// Port for the platform audio input
pub trait InputDevice: Send + Sync {
    /// Resolve the input route for the given preferences.
    fn activate(&self, preferences: &InputPreferences) -> Result<InputRoute, CaptureError>;

    /// Install a tap on the route and start delivering buffers.
    ///
    /// Buffers arrive in the route's native format until the returned
    /// stream is stopped.
    fn install_tap(
        &self,
        route: &InputRoute,
        preferences: &InputPreferences,
        callbacks: TapCallbacks,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;

    /// List available input devices
    fn list_inputs(&self) -> Result<Vec<InputInfo>, CaptureError>;
}

/// A running tap
pub trait CaptureStream: Send {
    /// Remove the tap and stop the stream.
    ///
    /// Returns once no further buffer callbacks can run.
    fn stop(self: Box<Self>) -> Result<(), CaptureError>;
}

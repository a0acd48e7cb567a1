//! Recorder session lifecycle

pub mod state;

pub use state::{InvalidStateTransition, RecorderSession, SessionState};

//! Aggregated recorder error and the shared "last error" slot

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::domain::session::InvalidStateTransition;

use super::ports::{CaptureError, ConversionError, PlaybackError, SinkError};

/// Errors surfaced by the recorder and player
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Output(#[from] SinkError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

/// Most recent error, shared between the control path and the audio thread.
///
/// Recording an error never interrupts the operation that produced it.
#[derive(Debug, Clone, Default)]
pub struct LastError {
    slot: Arc<Mutex<Option<RecorderError>>>,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: impl Into<RecorderError>) {
        let error = error.into();
        log::warn!("{}", error);
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn get(&self) -> Option<RecorderError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

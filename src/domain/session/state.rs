//! Recorder session state machine

use std::fmt;
use thiserror::Error;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    /// Pipeline torn down while the input route is rebuilt
    Reconfiguring,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Reconfiguring => "reconfiguring",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// Recorder session entity.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING -> RECONFIGURING (begin_reconfigure)
///   RECONFIGURING -> RECORDING (finish_reconfigure)
///   RECORDING | RECONFIGURING -> IDLE (stop)
#[derive(Debug, Default)]
pub struct RecorderSession {
    state: SessionState,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// True while the user considers the recorder running, including
    /// the gap of a route reconfiguration
    pub fn is_active(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Idle, SessionState::Recording, "start recording")
    }

    pub fn begin_reconfigure(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Recording,
            SessionState::Reconfiguring,
            "reconfigure",
        )
    }

    pub fn finish_reconfigure(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Reconfiguring,
            SessionState::Recording,
            "resume recording",
        )
    }

    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == SessionState::Idle {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "stop recording",
            });
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        self.state = to;
        Ok(())
    }
}

//! Input route snapshots and change detection

use std::fmt;

/// Why the input route changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    /// A new input device appeared (e.g. a headset connected)
    NewDeviceAvailable,
    /// The device in use went away
    OldDeviceUnavailable,
    /// The system default input moved to another existing device
    DefaultChanged,
    /// The user picked another input
    Override,
}

impl RouteChangeReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewDeviceAvailable => "new device available",
            Self::OldDeviceUnavailable => "old device unavailable",
            Self::DefaultChanged => "default input changed",
            Self::Override => "input override",
        }
    }
}

impl fmt::Display for RouteChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification that the active input route changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub reason: RouteChangeReason,
    pub previous: Option<String>,
    pub current: Option<String>,
}

impl RouteChange {
    /// A route change requested by the user selecting an input
    pub fn user_override(previous: Option<String>, current: Option<String>) -> Self {
        Self {
            reason: RouteChangeReason::Override,
            previous,
            current,
        }
    }
}

impl fmt::Display for RouteChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.reason,
            self.previous.as_deref().unwrap_or("none"),
            self.current.as_deref().unwrap_or("none")
        )
    }
}

/// Point-in-time view of the available inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSnapshot {
    pub default_input: Option<String>,
    pub inputs: Vec<String>,
}

impl RouteSnapshot {
    pub fn new(default_input: Option<String>, mut inputs: Vec<String>) -> Self {
        inputs.sort();
        inputs.dedup();
        Self {
            default_input,
            inputs,
        }
    }

    /// Compare against a newer snapshot.
    ///
    /// Device arrivals win over removals, removals over a bare default switch.
    pub fn diff(&self, next: &RouteSnapshot) -> Option<RouteChange> {
        let added = next.inputs.iter().any(|d| !self.inputs.contains(d));
        let removed = self.inputs.iter().any(|d| !next.inputs.contains(d));
        let default_moved = self.default_input != next.default_input;

        let reason = if added {
            RouteChangeReason::NewDeviceAvailable
        } else if removed {
            RouteChangeReason::OldDeviceUnavailable
        } else if default_moved {
            RouteChangeReason::DefaultChanged
        } else {
            return None;
        };

        Some(RouteChange {
            reason,
            previous: self.default_input.clone(),
            current: next.default_input.clone(),
        })
    }
}

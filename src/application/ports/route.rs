//! Input route monitoring port

use tokio::sync::mpsc;

use crate::domain::audio::RouteChange;

/// Port for route change notifications
pub trait RouteMonitor: Send + Sync {
    /// Start watching and return a stream of changes.
    ///
    /// The watch ends when the receiver is dropped.
    fn watch(&self) -> mpsc::Receiver<RouteChange>;
}

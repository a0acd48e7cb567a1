//! Input route monitoring adapters

mod cpal_watcher;

pub use cpal_watcher::{CpalRouteWatcher, DEFAULT_POLL_INTERVAL};

//! Route change detection by polling the cpal host

use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait};
use tokio::sync::mpsc;

use crate::application::ports::RouteMonitor;
use crate::domain::audio::{RouteChange, RouteSnapshot};

/// Default interval between device scans
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Watches the default input and the input device list
#[derive(Debug, Clone)]
pub struct CpalRouteWatcher {
    poll_interval: Duration,
}

impl CpalRouteWatcher {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Scan the host's current inputs
    pub fn snapshot() -> RouteSnapshot {
        let host = cpal::default_host();
        let default_input = host.default_input_device().and_then(|d| d.name().ok());
        let inputs = match host.input_devices() {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(e) => {
                log::debug!("Failed to enumerate inputs: {}", e);
                Vec::new()
            }
        };
        RouteSnapshot::new(default_input, inputs)
    }
}

impl Default for CpalRouteWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteMonitor for CpalRouteWatcher {
    fn watch(&self) -> mpsc::Receiver<RouteChange> {
        let (tx, rx) = mpsc::channel(8);
        let poll_interval = self.poll_interval;

        let spawned = thread::Builder::new()
            .name("route-watcher".to_string())
            .spawn(move || {
                let mut current = CpalRouteWatcher::snapshot();
                loop {
                    thread::sleep(poll_interval);
                    if tx.is_closed() {
                        break;
                    }
                    let next = CpalRouteWatcher::snapshot();
                    if let Some(change) = current.diff(&next) {
                        log::info!("Route change detected: {}", change);
                        if tx.blocking_send(change).is_err() {
                            break;
                        }
                    }
                    current = next;
                }
            });

        if let Err(e) = spawned {
            // The receiver is closed right away; recording works without it
            log::warn!("Failed to start route watcher: {}", e);
        }
        rx
    }
}

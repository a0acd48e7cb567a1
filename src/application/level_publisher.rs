//! Level publisher
//!
//! The audio thread drops raw RMS values into a lock-free slot; a ticker
//! task publishes the most recent one, normalized, at a fixed interval.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::audio::{LevelReading, LevelSettings};

pub struct LevelPublisher {
    settings: LevelSettings,
    /// f32 bits of the latest raw RMS
    latest_raw: AtomicU32,
    pending: AtomicBool,
    sender: watch::Sender<LevelReading>,
}

impl LevelPublisher {
    pub fn new(settings: LevelSettings) -> Self {
        let (sender, _) = watch::channel(LevelReading::SILENT);
        Self {
            settings,
            latest_raw: AtomicU32::new(0),
            pending: AtomicBool::new(false),
            sender,
        }
    }

    pub fn settings(&self) -> LevelSettings {
        self.settings
    }

    /// Record a raw RMS value. Safe to call from the audio thread.
    pub fn submit(&self, raw: f32) {
        self.latest_raw.store(raw.to_bits(), Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Publish the pending value, if any
    pub fn flush(&self) -> Option<LevelReading> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        let raw = f32::from_bits(self.latest_raw.load(Ordering::Relaxed));
        let reading = self.settings.reading(raw);
        self.sender.send_replace(reading);
        Some(reading)
    }

    /// Drop any pending value and publish silence
    pub fn reset(&self) {
        self.pending.store(false, Ordering::Release);
        self.latest_raw.store(0, Ordering::Relaxed);
        self.sender.send_replace(LevelReading::SILENT);
    }

    /// Last published reading
    pub fn current(&self) -> LevelReading {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LevelReading> {
        self.sender.subscribe()
    }

    /// Run the publishing ticker until the returned task is aborted
    pub fn spawn(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let publisher = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                publisher.flush();
            }
        })
    }
}

impl Default for LevelPublisher {
    fn default() -> Self {
        Self::new(LevelSettings::default())
    }
}

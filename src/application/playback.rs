//! Playback of the recorded file

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use super::error::{LastError, RecorderError};
use super::ports::{AudioPlayer, PlaybackOutcome};

pub struct PlaybackController<P: AudioPlayer> {
    player: P,
    path: PathBuf,
    is_playing: Arc<AtomicBool>,
    finished: Arc<Notify>,
    errors: LastError,
    /// Serializes play/stop
    control: Mutex<()>,
}

impl<P: AudioPlayer> PlaybackController<P> {
    pub fn new(player: P, path: impl Into<PathBuf>) -> Self {
        Self {
            player,
            path: path.into(),
            is_playing: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(Notify::new()),
            errors: LastError::new(),
            control: Mutex::new(()),
        }
    }

    /// Play the recording.
    ///
    /// A missing file is not an error: nothing plays and `is_playing`
    /// stays false.
    pub async fn play(&self) -> Result<(), RecorderError> {
        let _guard = self.control.lock().await;

        if !self.path.exists() {
            log::info!("Nothing to play, {} does not exist", self.path.display());
            return Ok(());
        }

        if self.is_playing.load(Ordering::SeqCst) {
            if let Err(e) = self.player.stop().await {
                self.errors.record(e);
            }
        }

        let is_playing = Arc::clone(&self.is_playing);
        let finished = Arc::clone(&self.finished);
        let path = self.path.display().to_string();
        let on_finished = Box::new(move |outcome: PlaybackOutcome| {
            is_playing.store(false, Ordering::SeqCst);
            match outcome {
                PlaybackOutcome::Completed => log::info!("Playback finished: {}", path),
                PlaybackOutcome::Stopped => log::info!("Playback stopped: {}", path),
            }
            finished.notify_waiters();
        });

        // Raised before the player can call back, so a very short file
        // cannot finish before the flag is set
        self.is_playing.store(true, Ordering::SeqCst);
        match self.player.play(&self.path, on_finished).await {
            Ok(()) => {
                log::info!("Playback started: {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                self.is_playing.store(false, Ordering::SeqCst);
                self.finished.notify_waiters();
                let error = RecorderError::from(e);
                self.errors.record(error.clone());
                Err(error)
            }
        }
    }

    /// Stop playback. A no-op when nothing is playing.
    pub async fn stop(&self) -> Result<(), RecorderError> {
        let _guard = self.control.lock().await;

        if !self.is_playing.load(Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.player.stop().await;
        self.is_playing.store(false, Ordering::SeqCst);
        self.finished.notify_waiters();

        result.map_err(|e| {
            let error = RecorderError::from(e);
            self.errors.record(error.clone());
            error
        })
    }

    /// Wait until the current playback ends
    pub async fn wait(&self) {
        loop {
            let notified = self.finished.notified();
            if !self.is_playing() {
                return;
            }
            notified.await;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<RecorderError> {
        self.errors.get()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

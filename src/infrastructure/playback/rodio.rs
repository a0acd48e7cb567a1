//! Rodio-based audio file player
//!
//! The output stream is not `Send`, so each playback runs on its own thread
//! that owns the stream and waits for the sink to drain.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};

use crate::application::ports::{AudioPlayer, FinishCallback, PlaybackError, PlaybackOutcome};

struct ActivePlayback {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ActivePlayback {
    /// Stop output and wait for the playback thread, which runs the
    /// finish callback on its way out
    fn halt(self) -> Result<(), PlaybackError> {
        self.stopped.store(true, Ordering::SeqCst);
        self.sink.stop();
        self.thread
            .join()
            .map_err(|_| PlaybackError::PlaybackFailed("Playback thread panicked".to_string()))
    }
}

/// Audio player implementation using rodio
#[derive(Default)]
pub struct RodioPlayer {
    active: Arc<Mutex<Option<ActivePlayback>>>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock(active: &Mutex<Option<ActivePlayback>>) -> MutexGuard<'_, Option<ActivePlayback>> {
    active.lock().unwrap_or_else(|e| e.into_inner())
}

/// Open the output, decode the file and start playing (called from spawn_blocking)
fn start_playback(
    path: PathBuf,
    on_finished: FinishCallback,
    active: Arc<Mutex<Option<ActivePlayback>>>,
) -> Result<(), PlaybackError> {
    // Reap a previous playback that already ran to the end
    let previous = lock(&active).take();
    if let Some(previous) = previous {
        previous.halt()?;
    }

    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<Arc<Sink>, PlaybackError>>(1);
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_flag = Arc::clone(&stopped);

    let thread = thread::Builder::new()
        .name("audio-playback".to_string())
        .spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(output) => output,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::DeviceNotAvailable(e.to_string())));
                    return;
                }
            };
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::PlaybackFailed(e.to_string())));
                    return;
                }
            };
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::OpenFailed(e.to_string())));
                    return;
                }
            };
            let source = match Decoder::new(BufReader::new(file)) {
                Ok(source) => source,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::DecodeFailed(e.to_string())));
                    return;
                }
            };

            sink.append(source);
            let sink = Arc::new(sink);
            if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
                return;
            }

            sink.sleep_until_end();

            let outcome = if stopped_flag.load(Ordering::SeqCst) {
                PlaybackOutcome::Stopped
            } else {
                PlaybackOutcome::Completed
            };
            on_finished(outcome);
        })
        .map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(sink)) => {
            *lock(&active) = Some(ActivePlayback {
                sink,
                stopped,
                thread,
            });
            Ok(())
        }
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => {
            let _ = thread.join();
            Err(PlaybackError::PlaybackFailed(
                "Playback thread exited before starting".to_string(),
            ))
        }
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, path: &Path, on_finished: FinishCallback) -> Result<(), PlaybackError> {
        let path = path.to_path_buf();
        let active = Arc::clone(&self.active);
        tokio::task::spawn_blocking(move || start_playback(path, on_finished, active))
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        let Some(playback) = lock(&self.active).take() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || playback.halt())
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_without_playback_is_ok() {
        let player = RodioPlayer::new();
        assert!(player.stop().await.is_ok());
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn undecodable_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let player = RodioPlayer::new();
        let err = player.play(&path, Box::new(|_| {})).await.unwrap_err();
        assert!(matches!(err, PlaybackError::DecodeFailed(_)));
    }
}

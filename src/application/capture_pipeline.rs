//! Capture pipeline
//!
//! Installs a tap on the input device, converts every buffer to the target
//! format, meters the original buffer and appends the converted frames to
//! the recording file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::audio::{output_frame_capacity, rms, AudioBuffer};

use super::error::{LastError, RecorderError};
use super::level_publisher::LevelPublisher;
use super::ports::{
    CaptureStream, InputDevice, InputPreferences, InputRoute, RecordingStore, SampleConverter,
    SampleSink, TapCallbacks,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

struct TapWork<C> {
    converter: C,
    converted: Vec<i16>,
}

/// State shared between the control side and the tap callback
struct TapState<C> {
    work: Mutex<TapWork<C>>,
    sink: Mutex<Option<Box<dyn SampleSink>>>,
    frames_written: AtomicU64,
    levels: Arc<LevelPublisher>,
    errors: LastError,
}

impl<C: SampleConverter> TapState<C> {
    /// Handle one delivered buffer. Errors are recorded, never raised:
    /// the tap keeps firing for the next buffer.
    fn process(&self, buffer: AudioBuffer<'_>) {
        let mut work = lock(&self.work);
        let TapWork {
            converter,
            converted,
        } = &mut *work;

        let target = converter.target();
        let capacity = output_frame_capacity(buffer.frames(), buffer.format, target);
        converted.clear();
        converted.reserve(capacity * target.channels as usize);

        let frames = match converter.convert(&buffer, converted) {
            Ok(frames) => frames,
            Err(e) => {
                self.errors.record(e);
                return;
            }
        };

        self.levels.submit(rms(&buffer));

        self.append(converted, frames);
    }

    /// Write what the converter still holds once no more buffers arrive
    fn drain(&self) {
        let mut work = lock(&self.work);
        let TapWork {
            converter,
            converted,
        } = &mut *work;

        converted.clear();
        match converter.flush(converted) {
            Ok(frames) => self.append(converted, frames),
            Err(e) => self.errors.record(e),
        }
    }

    fn append(&self, samples: &[i16], frames: usize) {
        if samples.is_empty() {
            return;
        }

        if let Some(sink) = lock(&self.sink).as_mut() {
            match sink.write(samples) {
                Ok(()) => {
                    self.frames_written
                        .fetch_add(frames as u64, Ordering::Relaxed);
                }
                Err(e) => self.errors.record(e),
            }
        }
    }
}

/// Tap-and-convert pipeline over one input device and one output file
pub struct CapturePipeline<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    device: D,
    store: S,
    tap: Arc<TapState<C>>,
    stream: Option<Box<dyn CaptureStream>>,
}

impl<D, C, S> CapturePipeline<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    pub fn new(
        device: D,
        converter: C,
        store: S,
        levels: Arc<LevelPublisher>,
        errors: LastError,
    ) -> Self {
        Self {
            device,
            store,
            tap: Arc::new(TapState {
                work: Mutex::new(TapWork {
                    converter,
                    converted: Vec::new(),
                }),
                sink: Mutex::new(None),
                frames_written: AtomicU64::new(0),
                levels,
                errors,
            }),
            stream: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Recreate the output file and install the tap on `route`.
    ///
    /// A tap left over from an earlier start is removed first.
    pub fn start(
        &mut self,
        route: &InputRoute,
        preferences: &InputPreferences,
    ) -> Result<(), RecorderError> {
        if self.stream.is_some() {
            if let Err(e) = self.stop() {
                self.tap.errors.record(e);
            }
        }

        let target = {
            let mut work = lock(&self.tap.work);
            work.converter.reset();
            work.converted.clear();
            work.converter.target()
        };

        let sink = self.store.create(target)?;
        *lock(&self.tap.sink) = Some(sink);
        self.tap.frames_written.store(0, Ordering::Relaxed);

        let tap = Arc::clone(&self.tap);
        let errors = self.tap.errors.clone();
        let callbacks = TapCallbacks {
            on_buffer: Box::new(move |buffer| tap.process(buffer)),
            on_error: Box::new(move |e| errors.record(e)),
        };

        match self.device.install_tap(route, preferences, callbacks) {
            Ok(stream) => {
                log::info!(
                    "Tap installed on {} ({} -> {})",
                    route.device_name,
                    route.format,
                    target
                );
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                // Leave no half-open file behind
                if let Err(close) = self.close_sink() {
                    log::warn!("{}", close);
                }
                Err(e.into())
            }
        }
    }

    /// Remove the tap, stop the stream and close the file.
    ///
    /// Frames the converter held back are written before the file closes.
    /// Returns after the last buffer write has completed.
    pub fn stop(&mut self) -> Result<(), RecorderError> {
        let stream_result = match self.stream.take() {
            Some(stream) => stream.stop().map_err(RecorderError::from),
            None => Ok(()),
        };
        self.tap.drain();
        let sink_result = self.close_sink();
        self.tap.levels.reset();

        stream_result?;
        sink_result
    }

    fn close_sink(&self) -> Result<(), RecorderError> {
        let sink = lock(&self.tap.sink).take();
        if let Some(sink) = sink {
            sink.finish()?;
            log::info!(
                "Recording closed: {} ({} frames)",
                self.store.path().display(),
                self.frames_written()
            );
        }
        Ok(())
    }

    /// Tap installed and file open
    pub fn is_recording(&self) -> bool {
        self.has_active_tap() && self.has_open_file()
    }

    pub fn has_active_tap(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_open_file(&self) -> bool {
        lock(&self.tap.sink).is_some()
    }

    /// Frames appended to the file since the last start
    pub fn frames_written(&self) -> u64 {
        self.tap.frames_written.load(Ordering::Relaxed)
    }

    pub fn output_path(&self) -> &Path {
        self.store.path()
    }
}

impl<D, C, S> Drop for CapturePipeline<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    fn drop(&mut self) {
        if self.stream.is_some() || self.has_open_file() {
            if let Err(e) = self.stop() {
                log::warn!("Failed to stop capture on drop: {}", e);
            }
        }
    }
}

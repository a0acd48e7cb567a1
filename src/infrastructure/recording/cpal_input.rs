//! Cross-platform audio input using cpal
//!
//! The cpal stream is not `Send`, so every tap gets a dedicated thread that
//! builds the stream, owns it, and drops it when the tap is removed.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig, SupportedStreamConfig, SupportedStreamConfigRange};

use crate::application::ports::{
    CaptureError, CaptureStream, InputDevice, InputInfo, InputPreferences, InputRoute,
    TapCallbacks,
};
use crate::domain::audio::{AudioBuffer, AudioFormat};

/// How often the capture thread checks for a stop request
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Audio input backed by the default cpal host
#[derive(Debug, Default)]
pub struct CpalInput;

impl CpalInput {
    pub fn new() -> Self {
        Self
    }

    fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        let Some(name) = name else {
            return host.default_input_device().ok_or(CaptureError::NoInputDevice);
        };

        host.input_devices()
            .map_err(|e| CaptureError::ActivationFailed(e.to_string()))?
            .find(|device| device.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))
    }

    /// Pick the stream configuration for a device.
    ///
    /// High-quality mode takes the highest sample rate the device offers,
    /// otherwise the device default is used.
    fn select_config(
        device: &cpal::Device,
        high_quality: bool,
    ) -> Result<SupportedStreamConfig, CaptureError> {
        let default = device
            .default_input_config()
            .map_err(|e| CaptureError::ActivationFailed(e.to_string()))?;
        if !high_quality {
            return Ok(default);
        }

        let ranges = device
            .supported_input_configs()
            .map_err(|e| CaptureError::ActivationFailed(e.to_string()))?;
        Ok(pick_high_quality(ranges).unwrap_or(default))
    }

    fn resolve(
        preferences: &InputPreferences,
        device_name: Option<&str>,
    ) -> Result<(cpal::Device, String, SupportedStreamConfig), CaptureError> {
        let host = cpal::default_host();
        let device = Self::find_device(&host, device_name)?;
        let name = device
            .name()
            .map_err(|e| CaptureError::ActivationFailed(e.to_string()))?;
        let config = Self::select_config(&device, preferences.high_quality)?;
        Ok((device, name, config))
    }
}

fn is_supported_sample_format(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
    )
}

/// Highest rate wins; on a tie fewer channels win.
fn pick_high_quality(
    ranges: impl Iterator<Item = SupportedStreamConfigRange>,
) -> Option<SupportedStreamConfig> {
    ranges
        .filter(|range| is_supported_sample_format(range.sample_format()))
        .max_by_key(|range| (range.max_sample_rate().0, Reverse(range.channels())))
        .map(|range| range.with_max_sample_rate())
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    callbacks: TapCallbacks,
) -> Result<cpal::Stream, CaptureError> {
    let format = AudioFormat::new(config.sample_rate.0, config.channels);
    let TapCallbacks {
        mut on_buffer,
        mut on_error,
    } = callbacks;

    let error_callback = move |err: cpal::StreamError| {
        log::error!("Audio stream error: {}", err);
        on_error(CaptureError::StreamFailed(err.to_string()));
    };

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                on_buffer(AudioBuffer::new(format, data));
            },
            error_callback,
            None,
        ),
        SampleFormat::I16 => {
            let mut scratch: Vec<f32> = Vec::new();
            device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| s as f32 / 32768.0));
                    on_buffer(AudioBuffer::new(format, &scratch));
                },
                error_callback,
                None,
            )
        }
        SampleFormat::U16 => {
            let mut scratch: Vec<f32> = Vec::new();
            device.build_input_stream(
                config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0));
                    on_buffer(AudioBuffer::new(format, &scratch));
                },
                error_callback,
                None,
            )
        }
        other => {
            return Err(CaptureError::TapFailed(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| CaptureError::TapFailed(e.to_string()))
}

impl InputDevice for CpalInput {
    fn activate(&self, preferences: &InputPreferences) -> Result<InputRoute, CaptureError> {
        let (_, device_name, config) = Self::resolve(preferences, preferences.device_name.as_deref())?;
        Ok(InputRoute {
            device_name,
            format: AudioFormat::new(config.sample_rate().0, config.channels()),
        })
    }

    fn install_tap(
        &self,
        route: &InputRoute,
        preferences: &InputPreferences,
        callbacks: TapCallbacks,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), CaptureError>>(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let device_name = route.device_name.clone();
        let preferences = preferences.clone();

        let thread = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let started = CpalInput::resolve(&preferences, Some(device_name.as_str())).and_then(
                    |(device, _, supported)| {
                        let stream = build_stream(
                            &device,
                            &supported.config(),
                            supported.sample_format(),
                            callbacks,
                        )?;
                        stream
                            .play()
                            .map_err(|e| CaptureError::TapFailed(e.to_string()))?;
                        Ok(stream)
                    },
                );

                let stream = match started {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                while !stop_flag.load(Ordering::SeqCst) {
                    thread::park_timeout(STOP_POLL_INTERVAL);
                }
                drop(stream);
            })
            .map_err(|e| CaptureError::TapFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalCaptureStream {
                stop,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(CaptureError::TapFailed(
                    "Capture thread exited before starting".to_string(),
                ))
            }
        }
    }

    fn list_inputs(&self) -> Result<Vec<InputInfo>, CaptureError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::ActivationFailed(e.to_string()))?;

        Ok(devices
            .filter_map(|device| device.name().ok())
            .map(|name| InputInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect())
    }
}

/// A tap running on its own capture thread
pub struct CpalCaptureStream {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCaptureStream {
    fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            thread
                .join()
                .map_err(|_| CaptureError::StreamFailed("Capture thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl CaptureStream for CpalCaptureStream {
    fn stop(mut self: Box<Self>) -> Result<(), CaptureError> {
        self.shutdown()
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

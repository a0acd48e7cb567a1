//! Session controller
//!
//! Owns the audio session activation and the capture pipeline. Every control
//! operation runs under one async mutex, so start, stop and reconfiguration
//! never interleave.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::domain::audio::{LevelReading, RouteChange};
use crate::domain::session::{RecorderSession, SessionState};

use super::capture_pipeline::CapturePipeline;
use super::error::{LastError, RecorderError};
use super::level_publisher::LevelPublisher;
use super::ports::{
    InputDevice, InputInfo, InputPreferences, InputRoute, RecordingStore, RouteMonitor,
    SampleConverter,
};

struct ControllerInner<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    pipeline: CapturePipeline<D, C, S>,
    session: RecorderSession,
    /// Activated route; `None` until first use or after a route change
    route: Option<InputRoute>,
    preferences: InputPreferences,
}

impl<D, C, S> ControllerInner<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    fn activated_route(&mut self) -> Result<InputRoute, RecorderError> {
        if let Some(route) = &self.route {
            return Ok(route.clone());
        }
        let route = self.pipeline.device().activate(&self.preferences)?;
        log::info!(
            "Audio session active on {} ({})",
            route.device_name,
            route.format
        );
        self.route = Some(route.clone());
        Ok(route)
    }

    fn start_pipeline(&mut self) -> Result<(), RecorderError> {
        let route = self.activated_route()?;
        let preferences = self.preferences.clone();
        self.pipeline.start(&route, &preferences)
    }
}

pub struct SessionController<D, C, S>
where
    D: InputDevice,
    C: SampleConverter + 'static,
    S: RecordingStore,
{
    inner: Mutex<ControllerInner<D, C, S>>,
    /// Session state mirrored outside the mutex for observers
    state: watch::Sender<SessionState>,
    levels: Arc<LevelPublisher>,
    errors: LastError,
    restart_delay: Duration,
}

impl<D, C, S> SessionController<D, C, S>
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
        preferences: InputPreferences,
        restart_delay: Duration,
    ) -> Self {
        let errors = LastError::new();
        let pipeline =
            CapturePipeline::new(device, converter, store, Arc::clone(&levels), errors.clone());
        Self {
            inner: Mutex::new(ControllerInner {
                pipeline,
                session: RecorderSession::new(),
                route: None,
                preferences,
            }),
            state: watch::channel(SessionState::Idle).0,
            levels,
            errors,
            restart_delay,
        }
    }

    pub async fn start_recording(&self) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        inner.session.start()?;

        let result = match inner.start_pipeline() {
            Ok(()) => {
                self.errors.clear();
                Ok(())
            }
            Err(e) => {
                self.errors.record(e.clone());
                let _ = inner.session.stop();
                // A failed activation should be retried on the next start
                inner.route = None;
                Err(e)
            }
        };
        self.publish_state(&inner);
        result
    }

    /// Stop recording. Stopping an idle recorder is a no-op.
    pub async fn stop_recording(&self) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.session.is_idle() {
            return Ok(());
        }
        inner.session.stop()?;
        self.publish_state(&inner);

        let result = inner.pipeline.stop();
        if let Err(e) = &result {
            self.errors.record(e.clone());
        }
        result
    }

    /// React to an input route change.
    ///
    /// While recording the pipeline is stopped, the session re-activated
    /// after a fixed delay and the pipeline started again. The restart
    /// recreates the output file.
    pub async fn handle_route_change(&self, change: RouteChange) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        log::info!("Input route changed: {}", change);
        inner.route = None;

        if inner.session.state() != SessionState::Recording {
            return Ok(());
        }
        self.reconfigure(&mut inner).await
    }

    /// Toggle high-quality Bluetooth input, rebuilding the pipeline if recording
    pub async fn set_bluetooth_high_quality(&self, enabled: bool) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.preferences.high_quality == enabled {
            return Ok(());
        }
        inner.preferences.high_quality = enabled;
        inner.route = None;

        if inner.session.state() != SessionState::Recording {
            return Ok(());
        }
        self.reconfigure(&mut inner).await
    }

    /// Select an input device by name (`None` for the system default)
    pub async fn select_input(&self, device_name: Option<String>) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.preferences.device_name == device_name {
            return Ok(());
        }
        let previous = inner.route.as_ref().map(|r| r.device_name.clone());
        inner.preferences.device_name = device_name.clone();
        inner.route = None;
        log::info!(
            "{}",
            RouteChange::user_override(previous, device_name)
        );

        if inner.session.state() != SessionState::Recording {
            return Ok(());
        }
        self.reconfigure(&mut inner).await
    }

    async fn reconfigure(
        &self,
        inner: &mut ControllerInner<D, C, S>,
    ) -> Result<(), RecorderError> {
        inner.session.begin_reconfigure()?;
        self.publish_state(inner);

        if let Err(e) = inner.pipeline.stop() {
            self.errors.record(e);
        }
        inner.route = None;

        tokio::time::sleep(self.restart_delay).await;

        let result = match inner.start_pipeline() {
            Ok(()) => inner.session.finish_reconfigure().map_err(RecorderError::from),
            Err(e) => {
                self.errors.record(e.clone());
                let _ = inner.session.stop();
                Err(e)
            }
        };
        self.publish_state(inner);
        result
    }

    fn publish_state(&self, inner: &ControllerInner<D, C, S>) {
        self.state.send_replace(inner.session.state());
    }

    /// Forward route changes from `monitor` until it stops producing them
    pub fn watch_routes<M: RouteMonitor>(self: &Arc<Self>, monitor: &M) -> JoinHandle<()>
    where
        D: 'static,
        S: 'static,
    {
        let mut changes = monitor.watch();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                // Failures are already in the last-error slot
                let _ = controller.handle_route_change(change).await;
            }
        })
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.session.state()
    }

    pub async fn is_recording(&self) -> bool {
        self.inner.lock().await.session.is_active()
    }

    /// Recording or reconfiguring, read without waiting on a running operation
    pub fn is_active(&self) -> bool {
        *self.state.borrow() != SessionState::Idle
    }

    /// Follow session state transitions
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn has_active_tap(&self) -> bool {
        self.inner.lock().await.pipeline.has_active_tap()
    }

    pub async fn has_open_file(&self) -> bool {
        self.inner.lock().await.pipeline.has_open_file()
    }

    pub async fn frames_written(&self) -> u64 {
        self.inner.lock().await.pipeline.frames_written()
    }

    pub async fn output_path(&self) -> PathBuf {
        self.inner.lock().await.pipeline.output_path().to_path_buf()
    }

    pub async fn preferences(&self) -> InputPreferences {
        self.inner.lock().await.preferences.clone()
    }

    /// Route of the current session, if activated
    pub async fn active_route(&self) -> Option<InputRoute> {
        self.inner.lock().await.route.clone()
    }

    pub async fn list_inputs(&self) -> Result<Vec<InputInfo>, RecorderError> {
        let inner = self.inner.lock().await;
        Ok(inner.pipeline.device().list_inputs()?)
    }

    pub fn last_error(&self) -> Option<RecorderError> {
        self.errors.get()
    }

    pub fn clear_error(&self) {
        self.errors.clear();
    }

    pub fn levels(&self) -> watch::Receiver<LevelReading> {
        self.levels.subscribe()
    }

    pub fn level_publisher(&self) -> &Arc<LevelPublisher> {
        &self.levels
    }
}

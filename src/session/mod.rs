//! Calibration session coordinator.
//!
//! [`CalibrationSession`] moves a [`CameraEngine`] onto a worker thread that
//! runs the acquisition loop and executes operations in the order they are
//! issued. State is published as whole [`SessionSnapshot`] values through a
//! watch channel, so any thread can render it.

mod snapshot;
mod stats;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use tokio::sync::{oneshot, watch};

use crate::camera::CameraEngine;
use crate::config::SessionConfig;
use crate::error::SessionError;

pub use snapshot::{CalibrationPhase, SessionSnapshot};
pub use stats::SessionStats;

use worker::{Reply, Request, Worker};

/// One coordinator operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Adopt calibration data from a file.
    LoadCalibration(PathBuf),
    /// Export the current calibration to a file.
    SaveCalibration(PathBuf),
    /// Commit the detected points as a calibration sample.
    CaptureCalibrationImage,
    /// Solve the calibration over the captured samples.
    CalibrateCamera,
    /// Discard samples and calibration, then re-query calibration status.
    ResetCalibration,
    /// Detection hint in frame-normalized coordinates.
    HandlePoint { x: f32, y: f32 },
    /// Secondary gesture without coordinates.
    HandleSecondaryAction,
    /// Toggle the detection overlay.
    SetShowOverlay(bool),
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::LoadCalibration(path) => write!(f, "load calibration ({})", path.display()),
            Operation::SaveCalibration(path) => write!(f, "save calibration ({})", path.display()),
            Operation::CaptureCalibrationImage => write!(f, "capture calibration image"),
            Operation::CalibrateCamera => write!(f, "calibrate camera"),
            Operation::ResetCalibration => write!(f, "reset calibration"),
            Operation::HandlePoint { x, y } => write!(f, "point ({:.3}, {:.3})", x, y),
            Operation::HandleSecondaryAction => write!(f, "secondary action"),
            Operation::SetShowOverlay(show) => write!(f, "show overlay = {}", show),
        }
    }
}

/// Cloneable handle for issuing operations and reading snapshots.
///
/// Every method is safe to call from any thread at any time; operations
/// whose preconditions are not met fail or do nothing.
#[derive(Clone)]
pub struct SessionHandle {
    request_tx: Sender<Request>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    stats: Arc<SessionStats>,
}

impl SessionHandle {
    /// Run `op` and block until it has completed.
    ///
    /// Safe on any thread, including one driving an async runtime, but the
    /// thread is parked until the worker replies. Waits for room if the
    /// command queue is full.
    pub fn execute(&self, op: Operation) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.request_tx
            .send(Request::Execute(op, Reply::Blocking(reply_tx)))
            .map_err(|_| SessionError::SessionClosed)?;
        reply_rx.recv().map_err(|_| SessionError::SessionClosed)?
    }

    /// Run `op` and wait for completion without blocking the executor.
    ///
    /// Fails with [`SessionError::QueueFull`] instead of waiting for room in
    /// the command queue.
    pub async fn execute_async(&self, op: Operation) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .try_send(Request::Execute(op, Reply::Async(reply_tx)))
            .map_err(|e| match e {
                TrySendError::Full(_) => SessionError::QueueFull,
                TrySendError::Disconnected(_) => SessionError::SessionClosed,
            })?;
        reply_rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    pub fn load_calibration(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::LoadCalibration(path.into()))
    }

    pub fn save_calibration(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::SaveCalibration(path.into()))
    }

    pub fn capture_calibration_image(&self) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::CaptureCalibrationImage)
    }

    pub fn calibrate_camera(&self) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::CalibrateCamera)
    }

    pub fn reset_calibration(&self) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::ResetCalibration)
    }

    /// Forward a marked point. Coordinates are clamped to `[0,1]`.
    pub fn handle_point(&self, x: f32, y: f32) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::HandlePoint { x, y })
    }

    pub fn handle_secondary_action(&self) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::HandleSecondaryAction)
    }

    pub fn set_show_overlay(&self, show: bool) -> Result<SessionSnapshot, SessionError> {
        self.execute(Operation::SetShowOverlay(show))
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

/// Owner of the session worker thread.
///
/// Dropping the session (or calling [`shutdown`](Self::shutdown)) stops the
/// acquisition loop, runs operations that are already queued, releases the
/// engine and joins the worker.
pub struct CalibrationSession {
    handle: SessionHandle,
    worker: Option<JoinHandle<()>>,
}

impl CalibrationSession {
    /// Start a session that owns `engine` until shutdown.
    pub fn start<E: CameraEngine>(engine: E, config: &SessionConfig) -> Result<Self, SessionError> {
        let (request_tx, request_rx) = bounded::<Request>(config.command_queue_capacity.max(1));
        let initial = SessionSnapshot::initial(config.show_overlay);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let stats = Arc::new(SessionStats::new());

        let worker = Worker::new(engine, snapshot_tx, Arc::clone(&stats));
        let frame_interval = config.frame_interval();

        let worker_handle = thread::Builder::new()
            .name("calibration-session".to_string())
            .spawn(move || worker.run(request_rx, frame_interval))
            .map_err(SessionError::Spawn)?;

        Ok(Self {
            handle: SessionHandle {
                request_tx,
                snapshot_rx,
                stats,
            },
            worker: Some(worker_handle),
        })
    }

    /// A handle for other threads (UI callbacks, command dispatchers).
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the session and wait for the engine to be released.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.request_tx.send(Request::Shutdown);
            if worker.join().is_err() {
                log::error!("Session worker panicked");
            }
        }
    }
}

impl std::ops::Deref for CalibrationSession {
    type Target = SessionHandle;

    fn deref(&self) -> &SessionHandle {
        &self.handle
    }
}

impl Drop for CalibrationSession {
    fn drop(&mut self) {
        self.stop();
    }
}

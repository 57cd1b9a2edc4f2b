//! Session worker: sole owner of the camera engine.
//!
//! Commands and acquisition ticks are both handled on this thread, so they
//! interleave but never overlap at the engine boundary.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver, Sender};
use tokio::sync::{oneshot, watch};

use super::{Operation, SessionSnapshot, SessionStats};
use crate::camera::CameraEngine;
use crate::error::SessionError;

pub(super) type OpResult = Result<SessionSnapshot, SessionError>;

/// Where an operation's result goes.
pub(super) enum Reply {
    /// Caller is parked on a plain channel receive.
    Blocking(Sender<OpResult>),
    /// Caller is awaiting.
    Async(oneshot::Sender<OpResult>),
}

impl Reply {
    fn send(self, result: OpResult) {
        // Caller may have stopped waiting.
        match self {
            Reply::Blocking(tx) => {
                let _ = tx.send(result);
            }
            Reply::Async(tx) => {
                let _ = tx.send(result);
            }
        }
    }
}

/// Messages sent to the worker thread.
pub(super) enum Request {
    /// Run one operation and reply with the resulting snapshot.
    Execute(Operation, Reply),
    /// Stop acquiring, finish queued operations, release the engine.
    Shutdown,
}

pub(super) struct Worker<E: CameraEngine> {
    engine: E,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    stats: Arc<SessionStats>,
}

impl<E: CameraEngine> Worker<E> {
    pub(super) fn new(
        engine: E,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        stats: Arc<SessionStats>,
    ) -> Self {
        Self {
            engine,
            snapshot_tx,
            stats,
        }
    }

    /// Worker thread main loop.
    pub(super) fn run(mut self, request_rx: Receiver<Request>, frame_interval: Duration) {
        log::info!(
            "Session worker started ({:.1} fps target)",
            1.0 / frame_interval.as_secs_f64()
        );

        // Late ticks are dropped by the ticker, never queued.
        let ticker = tick(frame_interval);

        loop {
            select! {
                recv(ticker) -> _ => self.refresh(),
                recv(request_rx) -> msg => match msg {
                    Ok(Request::Execute(op, reply)) => self.execute(op, reply),
                    Ok(Request::Shutdown) => break,
                    // All handles dropped
                    Err(_) => break,
                },
            }
        }

        drop(ticker);

        // Operations queued before shutdown still run.
        let mut drained = 0usize;
        while let Ok(request) = request_rx.try_recv() {
            if let Request::Execute(op, reply) = request {
                self.execute(op, reply);
                drained += 1;
            }
        }
        if drained > 0 {
            log::debug!("Session worker: finished {} queued operation(s)", drained);
        }

        self.engine.release();
        log::info!("Session worker stopped, camera released");
    }

    /// Acquisition tick: fetch the current frame and readiness flags.
    fn refresh(&mut self) {
        let show_overlay = self.snapshot_tx.borrow().show_overlay;

        let frame = self.engine.frame(show_overlay);
        let can_save = self.engine.can_save_calibration_image();
        let can_calibrate = self.engine.can_calibrate();

        self.stats.record_tick(frame.is_some());
        self.snapshot_tx.send_modify(|s| {
            s.frame = frame;
            s.can_save_calibration_image = can_save;
            s.can_calibrate_camera = can_calibrate;
        });
    }

    fn execute(&mut self, op: Operation, reply: Reply) {
        log::debug!("Session: {}", op);
        let name = op.to_string();
        let result = self.apply(op);

        match &result {
            Ok(_) => self.stats.record_command(true),
            Err(e) => {
                log::warn!("Session: {} failed: {}", name, e);
                self.stats.record_command(false);
            }
        }

        reply.send(result);
    }

    fn apply(&mut self, op: Operation) -> OpResult {
        match op {
            Operation::LoadCalibration(path) => {
                if let Err(source) = self.engine.load_calibration(&path) {
                    return Err(SessionError::CalibrationLoadFailed { path, source });
                }

                let reprojection_error = self.engine.reprojection_error();
                let count = self.engine.calibration_image_count();
                self.publish_with_readiness(|s| {
                    s.is_calibrated = true;
                    s.reprojection_error = reprojection_error;
                    s.calibration_image_count = count;
                });
                log::info!(
                    "Loaded calibration from {} ({} images, error {:.4})",
                    path.display(),
                    count,
                    reprojection_error
                );
            }
            Operation::SaveCalibration(path) => {
                if let Err(source) = self.engine.save_calibration(&path) {
                    return Err(SessionError::CalibrationSaveFailed { path, source });
                }
                log::info!("Saved calibration to {}", path.display());
            }
            Operation::CaptureCalibrationImage => {
                let accepted = self.engine.save_calibration_image();
                let reported = self.engine.calibration_image_count();
                let previous = self.snapshot_tx.borrow().calibration_image_count;

                if !accepted {
                    log::debug!("Capture rejected: no detected calibration points");
                }
                if reported < previous {
                    log::warn!(
                        "Engine reported {} calibration images after capture, keeping {}",
                        reported,
                        previous
                    );
                }

                let count = reported.max(previous);
                self.publish_with_readiness(|s| s.calibration_image_count = count);
            }
            Operation::CalibrateCamera => {
                let calibrated = self.engine.calibrate();
                // A failed solve keeps the last reprojection error.
                let reprojection_error = calibrated.then(|| self.engine.reprojection_error());

                self.publish_with_readiness(|s| {
                    s.is_calibrated = calibrated;
                    if let Some(error) = reprojection_error {
                        s.reprojection_error = error;
                    }
                });

                match reprojection_error {
                    Some(error) => log::info!("Camera calibrated, reprojection error {:.4}", error),
                    None => return Err(SessionError::CalibrationComputeFailed),
                }
            }
            Operation::ResetCalibration => {
                self.engine.reset_calibration();
                let count = self.engine.calibration_image_count();
                // Re-query calibration status from whatever samples remain.
                let calibrated = self.engine.calibrate();
                let reprojection_error = self.engine.reprojection_error();

                self.publish_with_readiness(|s| {
                    s.calibration_image_count = count;
                    s.is_calibrated = calibrated;
                    s.reprojection_error = reprojection_error;
                });
                log::info!("Calibration reset ({} images remain)", count);
            }
            Operation::HandlePoint { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(SessionError::InvalidPoint { x, y });
                }
                self.engine.handle_click(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
            }
            Operation::HandleSecondaryAction => self.engine.handle_secondary_click(),
            Operation::SetShowOverlay(show) => {
                self.snapshot_tx.send_modify(|s| s.show_overlay = show);
            }
        }

        Ok(self.snapshot_tx.borrow().clone())
    }

    /// Apply `update` together with fresh readiness flags in one replace.
    fn publish_with_readiness(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        let can_save = self.engine.can_save_calibration_image();
        let can_calibrate = self.engine.can_calibrate();
        self.snapshot_tx.send_modify(|s| {
            update(s);
            s.can_save_calibration_image = can_save;
            s.can_calibrate_camera = can_calibrate;
        });
    }
}

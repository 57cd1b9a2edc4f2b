//! Camera Calibration Session Coordinator
//!
//! Drives a camera-calibration workflow on top of a pluggable camera engine:
//! - Live acquisition loop publishing whole-state snapshots
//! - Serialized load/save/capture/calibrate/reset operations
//! - Command dispatch with operator notifications
//! - Delimited-text calibration files

pub mod calibration;
pub mod camera;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;

pub use camera::{CameraEngine, Frame};
pub use error::{EngineError, SessionError};
pub use session::{CalibrationSession, SessionHandle, SessionSnapshot};

//! Error types for the calibration session and camera engines.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a camera engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Calibration file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed calibration data: {0}")]
    Malformed(String),
    #[error("Camera is not calibrated")]
    NotCalibrated,
}

/// Errors returned by session operations.
///
/// Every variant is recoverable: the operation can be retried immediately.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to load camera calibration data from {path}: {source}")]
    CalibrationLoadFailed {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("Failed to save camera calibration data to {path}: {source}")]
    CalibrationSaveFailed {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("Camera calibration failed: not enough valid calibration images")]
    CalibrationComputeFailed,
    #[error("Invalid point coordinates ({x}, {y})")]
    InvalidPoint { x: f32, y: f32 },
    #[error("Calibration session is closed")]
    SessionClosed,
    #[error("Session command queue is full")]
    QueueFull,
    #[error("Unsupported calibration file type: {path}")]
    UnsupportedFileType { path: PathBuf },
    #[error("Failed to spawn session worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors loading a session configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

//! Calibration data persistence.

mod file;

pub use file::{CalibrationRecord, CameraIntrinsics, SamplePoints};

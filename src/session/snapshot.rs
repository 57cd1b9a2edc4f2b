//! Published session state.

use crate::camera::Frame;

/// Immutable view of the calibration session at one point in time.
///
/// The coordinator replaces the whole snapshot at once; readers never see a
/// mix of fields from two refresh cycles.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Latest frame, with the detection overlay when `show_overlay` is set.
    pub frame: Option<Frame>,
    /// Whether a valid calibration currently exists.
    pub is_calibrated: bool,
    /// Quality of the current calibration. Only meaningful when calibrated.
    pub reprojection_error: f64,
    /// Number of captured calibration samples.
    pub calibration_image_count: usize,
    /// Whether the engine holds enough detected points to accept a capture.
    pub can_save_calibration_image: bool,
    /// Whether enough samples exist to attempt calibration.
    pub can_calibrate_camera: bool,
    /// Whether the detection overlay is drawn into `frame`.
    pub show_overlay: bool,
}

impl SessionSnapshot {
    pub fn initial(show_overlay: bool) -> Self {
        Self {
            frame: None,
            is_calibrated: false,
            reprojection_error: 0.0,
            calibration_image_count: 0,
            can_save_calibration_image: false,
            can_calibrate_camera: false,
            show_overlay,
        }
    }

    /// Reprojection error if it is currently valid.
    pub fn valid_reprojection_error(&self) -> Option<f64> {
        self.is_calibrated.then_some(self.reprojection_error)
    }

    pub fn phase(&self) -> CalibrationPhase {
        match (self.is_calibrated, self.calibration_image_count) {
            (true, samples) => CalibrationPhase::Calibrated { samples },
            (false, 0) => CalibrationPhase::Uncalibrated,
            (false, samples) => CalibrationPhase::Capturing { samples },
        }
    }
}

// Byte-for-byte comparison: a NaN reprojection error equals itself.
impl PartialEq for SessionSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && self.is_calibrated == other.is_calibrated
            && self.reprojection_error.to_bits() == other.reprojection_error.to_bits()
            && self.calibration_image_count == other.calibration_image_count
            && self.can_save_calibration_image == other.can_save_calibration_image
            && self.can_calibrate_camera == other.can_calibrate_camera
            && self.show_overlay == other.show_overlay
    }
}

/// Calibration progress derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    /// No samples, no calibration.
    Uncalibrated,
    /// Samples captured, not calibrated yet.
    Capturing { samples: usize },
    /// A calibration exists.
    Calibrated { samples: usize },
}

impl std::fmt::Display for CalibrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationPhase::Uncalibrated => write!(f, "Uncalibrated"),
            CalibrationPhase::Capturing { samples } => write!(f, "Capturing ({} images)", samples),
            CalibrationPhase::Calibrated { samples } => {
                write!(f, "Calibrated ({} images)", samples)
            }
        }
    }
}

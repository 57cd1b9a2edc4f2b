//! Camera engine contract.
//!
//! A camera engine owns the physical camera, its frame buffer, the detected
//! calibration points and the calibration solver. The session coordinator is
//! the only caller and never calls into an engine from two threads at once.

mod frame;
mod synthetic;

use std::path::Path;

use crate::error::EngineError;

pub use frame::{normalize_pointer, Frame, PixelFormat};
pub use synthetic::{SyntheticCamera, SyntheticCameraConfig, MIN_CALIBRATION_IMAGES};

/// Camera plus calibration solver driven by the session coordinator.
pub trait CameraEngine: Send + 'static {
    /// Grab the current frame, drawing the detection overlay when requested.
    /// Returns `None` while no frame is available (e.g. hardware lost).
    fn frame(&mut self, show_overlay: bool) -> Option<Frame>;

    /// Whether the currently detected points can be committed as a sample.
    fn can_save_calibration_image(&self) -> bool;

    /// Whether enough samples exist to attempt calibration.
    fn can_calibrate(&self) -> bool;

    /// Parse and adopt calibration data from `path`.
    ///
    /// On error the engine must keep its previous calibration.
    fn load_calibration(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Write the current calibration to `path`.
    fn save_calibration(&self, path: &Path) -> Result<(), EngineError>;

    /// Commit the detected point set as a sample. Returns false if rejected.
    fn save_calibration_image(&mut self) -> bool;

    /// Number of committed samples.
    fn calibration_image_count(&self) -> usize;

    /// Solve the calibration over the committed samples.
    fn calibrate(&mut self) -> bool;

    /// Reprojection error of the current calibration, NaN if uncalibrated.
    fn reprojection_error(&self) -> f64;

    /// Discard all samples and any calibration.
    fn reset_calibration(&mut self);

    /// Detection hint at frame-normalized coordinates.
    fn handle_click(&mut self, x: f32, y: f32);

    /// Secondary gesture (clear the current selection).
    fn handle_secondary_click(&mut self);

    /// Release the underlying hardware. Called once, before the engine is dropped.
    fn release(&mut self) {}
}

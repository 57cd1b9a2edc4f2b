//! Synthetic camera engine.
//!
//! Renders a test scene instead of reading hardware. When the target is
//! visible the scene contains a checkerboard whose 7x7 interior corners count
//! as detected calibration points. Calibration does not solve anything: a
//! successful calibrate reports the configured reprojection error.

use std::path::Path;

use bytes::Bytes;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::{CameraEngine, Frame, PixelFormat};
use crate::calibration::{CalibrationRecord, CameraIntrinsics, SamplePoints};
use crate::error::EngineError;

/// Samples required before calibration is attempted.
pub const MIN_CALIBRATION_IMAGES: usize = 5;

/// Interior corners per checkerboard side.
const BOARD_CORNERS: u32 = 7;

const OVERLAY_CORNER: [u8; 3] = [0, 0, 255];
const OVERLAY_SELECTION: [u8; 3] = [0, 255, 0];

/// Synthetic camera settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticCameraConfig {
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Reprojection error reported by a successful calibration.
    pub reprojection_error: f64,
    /// Whether the checkerboard is in view at startup.
    pub target_visible: bool,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            reprojection_error: 0.35,
            target_visible: true,
        }
    }
}

/// Hardware-free [`CameraEngine`].
pub struct SyntheticCamera {
    config: SyntheticCameraConfig,
    target_visible: bool,
    frame_count: u64,
    /// Corners detected in the last rendered frame.
    detected_corners: SamplePoints,
    samples: Vec<SamplePoints>,
    intrinsics: CameraIntrinsics,
    distortion: [f64; 5],
    is_calibrated: bool,
    reprojection_error: f64,
    /// Operator-marked point, in pixels.
    selection: Option<[f32; 2]>,
    released: bool,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticCameraConfig) -> Self {
        log::info!(
            "Synthetic camera: {}x{}, target {}",
            config.width,
            config.height,
            if config.target_visible { "visible" } else { "hidden" }
        );
        Self {
            target_visible: config.target_visible,
            intrinsics: CameraIntrinsics::centered(config.width, config.height),
            config,
            frame_count: 0,
            detected_corners: Vec::new(),
            samples: Vec::new(),
            distortion: [0.0; 5],
            is_calibrated: false,
            reprojection_error: f64::NAN,
            selection: None,
            released: false,
        }
    }

    /// Move the checkerboard into or out of view.
    pub fn set_target_visible(&mut self, visible: bool) {
        self.target_visible = visible;
    }

    /// Operator-marked point in pixels, if any.
    pub fn selection(&self) -> Option<[f32; 2]> {
        self.selection
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Board square size and top-left corner for the current frame.
    fn board_geometry(&self) -> (u32, u32, u32) {
        let square = (self.config.width.min(self.config.height) / 12).max(2);
        let board = square * (BOARD_CORNERS + 1);
        // Drift the board a little so consecutive samples differ.
        let drift = (self.frame_count % 16) as u32;
        let left = (self.config.width.saturating_sub(board)) / 2 + drift;
        let top = (self.config.height.saturating_sub(board)) / 2 + drift / 2;
        (square, left, top)
    }

    fn board_corners(&self) -> SamplePoints {
        let (square, left, top) = self.board_geometry();
        (1..=BOARD_CORNERS)
            .flat_map(|row| {
                (1..=BOARD_CORNERS).map(move |col| {
                    [(left + col * square) as f32, (top + row * square) as f32]
                })
            })
            .collect()
    }

    fn render(&self, show_overlay: bool) -> RgbImage {
        let (width, height) = (self.config.width, self.config.height);
        let (square, left, top) = self.board_geometry();
        let board = square * (BOARD_CORNERS + 1);
        let visible = self.target_visible;

        // Channels are stored in BGR order.
        let mut img = RgbImage::from_fn(width, height, |x, y| {
            if visible && x >= left && x < left + board && y >= top && y < top + board {
                let cell = (x - left) / square + (y - top) / square;
                let v = if cell % 2 == 0 { 235 } else { 20 };
                return Rgb([v, v, v]);
            }
            let shade = (64 + (x * 64) / width.max(1)) as u8;
            Rgb([shade, shade, (64 + (y * 64) / height.max(1)) as u8])
        });

        if show_overlay {
            for [x, y] in &self.detected_corners {
                draw_marker(&mut img, *x, *y, 1, OVERLAY_CORNER);
            }
        }
        if let Some([x, y]) = self.selection {
            draw_marker(&mut img, x, y, 3, OVERLAY_SELECTION);
        }

        img
    }
}

fn draw_marker(img: &mut RgbImage, x: f32, y: f32, radius: i64, color: [u8; 3]) {
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (px, py) = (cx + dx, cy + dy);
            if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, Rgb(color));
            }
        }
    }
}

impl CameraEngine for SyntheticCamera {
    fn frame(&mut self, show_overlay: bool) -> Option<Frame> {
        if self.released {
            return None;
        }

        self.detected_corners = if self.target_visible {
            self.board_corners()
        } else {
            Vec::new()
        };

        let img = self.render(show_overlay);
        let frame = Frame {
            width: img.width(),
            height: img.height(),
            format: PixelFormat::Bgr24,
            frame_number: self.frame_count,
            data: Bytes::from(img.into_raw()),
        };
        self.frame_count += 1;
        Some(frame)
    }

    fn can_save_calibration_image(&self) -> bool {
        !self.detected_corners.is_empty()
    }

    fn can_calibrate(&self) -> bool {
        self.samples.len() >= MIN_CALIBRATION_IMAGES
    }

    fn load_calibration(&mut self, path: &Path) -> Result<(), EngineError> {
        let record = CalibrationRecord::read(path)?;

        self.reprojection_error = record.reprojection_error;
        self.intrinsics = record.intrinsics;
        self.distortion = record.distortion;
        self.samples = record.samples;
        self.is_calibrated = true;

        log::info!(
            "Synthetic camera: loaded calibration with {} samples from {}",
            self.samples.len(),
            path.display()
        );
        Ok(())
    }

    fn save_calibration(&self, path: &Path) -> Result<(), EngineError> {
        if !self.is_calibrated {
            return Err(EngineError::NotCalibrated);
        }

        let record = CalibrationRecord {
            reprojection_error: self.reprojection_error,
            intrinsics: self.intrinsics,
            distortion: self.distortion,
            samples: self.samples.clone(),
        };
        record.write(path)
    }

    fn save_calibration_image(&mut self) -> bool {
        if !self.can_save_calibration_image() {
            return false;
        }
        self.samples.push(self.detected_corners.clone());
        true
    }

    fn calibration_image_count(&self) -> usize {
        self.samples.len()
    }

    fn calibrate(&mut self) -> bool {
        if !self.can_calibrate() {
            return false;
        }

        self.intrinsics = CameraIntrinsics::centered(self.config.width, self.config.height);
        self.reprojection_error = self.config.reprojection_error;
        self.is_calibrated = true;
        true
    }

    fn reprojection_error(&self) -> f64 {
        self.reprojection_error
    }

    fn reset_calibration(&mut self) {
        self.reprojection_error = f64::NAN;
        self.samples.clear();
        self.distortion = [0.0; 5];
        self.is_calibrated = false;
    }

    fn handle_click(&mut self, x: f32, y: f32) {
        self.selection = Some([
            x * self.config.width as f32,
            y * self.config.height as f32,
        ]);
    }

    fn handle_secondary_click(&mut self) {
        self.selection = None;
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.detected_corners.clear();
            log::info!("Synthetic camera: released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> SyntheticCamera {
        SyntheticCamera::new(SyntheticCameraConfig {
            width: 120,
            height: 96,
            reprojection_error: 0.42,
            target_visible: true,
        })
    }

    fn capture_samples(cam: &mut SyntheticCamera, n: usize) {
        for _ in 0..n {
            cam.frame(false);
            assert!(cam.save_calibration_image());
        }
    }

    #[test]
    fn test_frame_is_complete_bgr() {
        let mut cam = camera();
        let frame = cam.frame(true).unwrap();
        assert_eq!(frame.format, PixelFormat::Bgr24);
        assert!(frame.is_complete());
        assert_eq!(cam.frame(true).unwrap().frame_number, 1);
    }

    #[test]
    fn test_detection_follows_target_visibility() {
        let mut cam = camera();
        cam.frame(false);
        assert!(cam.can_save_calibration_image());

        cam.set_target_visible(false);
        cam.frame(false);
        assert!(!cam.can_save_calibration_image());
        assert!(!cam.save_calibration_image());
        assert_eq!(cam.calibration_image_count(), 0);
    }

    #[test]
    fn test_calibrate_requires_minimum_samples() {
        let mut cam = camera();
        capture_samples(&mut cam, MIN_CALIBRATION_IMAGES - 1);
        assert!(!cam.calibrate());
        assert!(cam.reprojection_error().is_nan());

        capture_samples(&mut cam, 1);
        assert!(cam.can_calibrate());
        assert!(cam.calibrate());
        assert_eq!(cam.reprojection_error(), 0.42);
    }

    #[test]
    fn test_reset_clears_calibration() {
        let mut cam = camera();
        capture_samples(&mut cam, MIN_CALIBRATION_IMAGES);
        assert!(cam.calibrate());

        cam.reset_calibration();
        assert_eq!(cam.calibration_image_count(), 0);
        assert!(!cam.calibrate());
        assert!(cam.reprojection_error().is_nan());
    }

    #[test]
    fn test_save_requires_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera();
        let err = cam.save_calibration(&dir.path().join("calib.csv")).unwrap_err();
        assert!(matches!(err, EngineError::NotCalibrated));
    }

    #[test]
    fn test_save_then_load_restores_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.csv");

        let mut cam = camera();
        capture_samples(&mut cam, MIN_CALIBRATION_IMAGES);
        assert!(cam.calibrate());
        cam.save_calibration(&path).unwrap();

        let mut restored = camera();
        restored.load_calibration(&path).unwrap();
        assert_eq!(restored.reprojection_error(), 0.42);
        assert_eq!(restored.calibration_image_count(), MIN_CALIBRATION_IMAGES);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "not,a,calibration\n").unwrap();

        let mut cam = camera();
        capture_samples(&mut cam, 2);
        assert!(cam.load_calibration(&path).is_err());
        assert_eq!(cam.calibration_image_count(), 2);
        assert!(cam.reprojection_error().is_nan());
    }

    #[test]
    fn test_clicks_mark_and_clear_selection() {
        let mut cam = camera();
        cam.handle_click(0.5, 0.25);
        assert_eq!(cam.selection(), Some([60.0, 24.0]));

        let frame = cam.frame(false).unwrap();
        assert_eq!(frame.pixel(60, 24), Some(OVERLAY_SELECTION));

        cam.handle_secondary_click();
        assert_eq!(cam.selection(), None);
    }

    #[test]
    fn test_released_camera_yields_no_frames() {
        let mut cam = camera();
        cam.release();
        assert!(cam.is_released());
        assert!(cam.frame(true).is_none());
        assert!(!cam.can_save_calibration_image());
    }
}

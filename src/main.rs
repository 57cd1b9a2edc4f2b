//! Camera Calibrator
//!
//! Runs a headless calibration session on the synthetic camera and writes the
//! resulting calibration file (first argument, default `calibration.csv`).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use camera_calibrator::camera::SyntheticCamera;
use camera_calibrator::config::SessionConfig;
use camera_calibrator::session::CalibrationSession;

const CONFIG_ENV: &str = "CAMERA_CALIBRATOR_CONFIG";
const MAX_CAPTURE_ATTEMPTS: usize = 200;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Camera Calibrator starting...");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load session config: {}", e);
            std::process::exit(1);
        }
    };

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("calibration.csv"));

    if let Err(e) = run(&config, &output) {
        log::error!("Calibration run failed: {}", e);
        std::process::exit(1);
    }

    log::info!("Camera Calibrator exiting");
}

fn load_config() -> Result<SessionConfig, camera_calibrator::error::ConfigError> {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(SessionConfig::default_path);

    match path {
        Some(path) => SessionConfig::load_or_default(&path),
        None => Ok(SessionConfig::default()),
    }
}

fn run(config: &SessionConfig, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let camera = SyntheticCamera::new(config.synthetic_camera.clone());
    let session = CalibrationSession::start(camera, config)?;

    // Wait for the first detection before capturing.
    let deadline = Instant::now() + Duration::from_secs(2);
    while !session.snapshot().can_save_calibration_image {
        if Instant::now() > deadline {
            return Err("calibration target not detected".into());
        }
        std::thread::sleep(config.frame_interval());
    }

    let mut attempts = 0;
    while !session.snapshot().can_calibrate_camera {
        attempts += 1;
        if attempts > MAX_CAPTURE_ATTEMPTS {
            return Err("not enough calibration images captured".into());
        }
        let snapshot = session.capture_calibration_image()?;
        log::info!("Captured calibration image {}", snapshot.calibration_image_count);
        std::thread::sleep(config.frame_interval());
    }

    let calibrated = session.calibrate_camera()?;
    log::info!(
        "{}: reprojection error {:.4}",
        calibrated.phase(),
        calibrated.reprojection_error
    );

    session.save_calibration(output)?;

    // Verify the file restores the same calibration.
    session.reset_calibration()?;
    let restored = session.load_calibration(output)?;
    log::info!(
        "Restored from {}: {} ({:.1} fps average)",
        output.display(),
        restored.phase(),
        session.stats().average_fps()
    );

    session.shutdown();
    Ok(())
}

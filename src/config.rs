//! Session configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::SyntheticCameraConfig;
use crate::error::ConfigError;

/// File name looked up under the platform config directory.
pub const CONFIG_FILE_NAME: &str = "session.json";

/// Calibration session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Acquisition loop rate in frames per second.
    pub target_fps: u32,
    /// Whether the detection overlay is drawn at startup.
    pub show_overlay: bool,
    /// Capacity of the pending command queue.
    pub command_queue_capacity: usize,
    /// Calibration file filter offered to file pickers.
    pub calibration_file_filter: FileFilter,
    /// Synthetic engine settings (used by the demo binary).
    pub synthetic_camera: SyntheticCameraConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            show_overlay: true,
            command_queue_capacity: 64,
            calibration_file_filter: FileFilter::default(),
            synthetic_camera: SyntheticCameraConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Interval between acquisition ticks. A zero rate is treated as 1 fps.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::info!("Loading session config from {}", path.display());
            Self::load(path)
        } else {
            log::info!("No session config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default config location: `<config dir>/camera-calibrator/session.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("camera-calibrator").join(CONFIG_FILE_NAME))
    }
}

/// File type filter for calibration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Display name, e.g. "CSV files".
    pub name: String,
    /// Accepted extensions without the leading dot.
    pub extensions: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            name: "CSV files".to_string(),
            extensions: vec!["csv".to_string()],
        }
    }
}

impl FileFilter {
    /// Whether `path` carries one of the accepted extensions. An empty
    /// filter accepts every path.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.target_fps, 60);
        assert!(config.show_overlay);
        assert_eq!(config.frame_interval(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let config = SessionConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "target_fps": 30 }"#).unwrap();
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.command_queue_capacity, 64);
        assert_eq!(config.synthetic_camera.width, 640);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = SessionConfig {
            target_fps: 24,
            show_overlay: false,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = SessionConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.target_fps, 24);
        assert!(!loaded.show_overlay);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SessionConfig::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded.target_fps, 60);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SessionConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_filter_matches_extension() {
        let filter = FileFilter::default();
        assert!(filter.matches(Path::new("calib.CSV")));
        assert!(!filter.matches(Path::new("calib.txt")));
        assert!(!filter.matches(Path::new("calib")));

        let any = FileFilter {
            name: "All files".to_string(),
            extensions: Vec::new(),
        };
        assert!(any.matches(Path::new("calib")));
    }
}

//! Delimited-text calibration files.
//!
//! ```text
//! projErr,fx,fy,cx,cy,k1,k2,p1,p2,k3
//! Calibration 1,x1,y1,x2,y2,...
//! ```
//!
//! One header row with the reprojection error, intrinsics and distortion
//! coefficients, then one row per calibration sample holding its image points.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::error::EngineError;

const HEADER_FIELDS: usize = 10;

/// Pinhole intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Unit focal length with the principal point at the image centre.
    pub fn centered(width: u32, height: u32) -> Self {
        Self {
            fx: 1.0,
            fy: 1.0,
            cx: 0.5 * width as f64,
            cy: 0.5 * height as f64,
        }
    }
}

/// Image points of one calibration sample, in pixels.
pub type SamplePoints = Vec<[f32; 2]>;

/// Everything persisted for a calibrated camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub reprojection_error: f64,
    pub intrinsics: CameraIntrinsics,
    /// k1, k2, p1, p2, k3.
    pub distortion: [f64; 5],
    pub samples: Vec<SamplePoints>,
}

impl CalibrationRecord {
    /// Render the record in file form.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let CameraIntrinsics { fx, fy, cx, cy } = self.intrinsics;
        let [k1, k2, p1, p2, k3] = self.distortion;
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            self.reprojection_error, fx, fy, cx, cy, k1, k2, p1, p2, k3
        );

        for (i, points) in self.samples.iter().enumerate() {
            let _ = write!(out, "Calibration {}", i + 1);
            for [x, y] in points {
                let _ = write!(out, ",{},{}", x, y);
            }
            out.push('\n');
        }

        out
    }

    /// Parse a record. Any malformed field rejects the whole file.
    pub fn from_csv(text: &str) -> Result<Self, EngineError> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| EngineError::Malformed("missing header row".to_string()))?;

        let fields: Vec<&str> = header.split(',').collect();
        if fields.len() < HEADER_FIELDS {
            return Err(EngineError::Malformed(format!(
                "header has {} fields, expected {}",
                fields.len(),
                HEADER_FIELDS
            )));
        }
        let values = fields[..HEADER_FIELDS]
            .iter()
            .map(|f| parse_field::<f64>(f))
            .collect::<Result<Vec<_>, _>>()?;

        let mut samples = Vec::new();
        for (row, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // First entry only labels the sample.
            let coords: Vec<&str> = line.split(',').skip(1).collect();
            if coords.len() % 2 != 0 {
                return Err(EngineError::Malformed(format!(
                    "sample row {} has an unpaired coordinate",
                    row + 1
                )));
            }
            let points = coords
                .chunks(2)
                .map(|pair| -> Result<[f32; 2], EngineError> {
                    Ok([parse_field(pair[0])?, parse_field(pair[1])?])
                })
                .collect::<Result<SamplePoints, _>>()?;
            samples.push(points);
        }

        Ok(Self {
            reprojection_error: values[0],
            intrinsics: CameraIntrinsics {
                fx: values[1],
                fy: values[2],
                cx: values[3],
                cy: values[4],
            },
            distortion: [values[5], values[6], values[7], values[8], values[9]],
            samples,
        })
    }

    /// Read and parse a calibration file.
    pub fn read(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_csv(&contents)
    }

    /// Write the record to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

fn parse_field<T: FromStr>(field: &str) -> Result<T, EngineError> {
    let field = field.trim();
    field
        .parse()
        .map_err(|_| EngineError::Malformed(format!("invalid number '{}'", field)))
}

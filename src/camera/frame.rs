//! Video frames handed out by camera engines.

use bytes::Bytes;

/// Pixel layout of a frame's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit blue, green, red; 3 bytes per pixel.
    Bgr24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Bgr24 => 3,
        }
    }
}

/// Video frame produced by a camera engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout of `data`.
    pub format: PixelFormat,
    /// Frame number, increasing per captured frame.
    pub frame_number: u64,
    /// Raw pixel data, tightly packed rows.
    pub data: Bytes,
}

impl Frame {
    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Whether `data` holds exactly one full image.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.stride() * self.height as usize
    }

    /// Pixel at `(x, y)` as `[b, g, r]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Convert a pointer position inside a displayed image into frame-normalized
/// coordinates in `[0,1]×[0,1]`.
///
/// Returns `None` when the displayed image has no area.
pub fn normalize_pointer(
    pointer_x: f32,
    pointer_y: f32,
    displayed_width: f32,
    displayed_height: f32,
) -> Option<(f32, f32)> {
    if displayed_width <= 0.0 || displayed_height <= 0.0 {
        return None;
    }
    Some((
        (pointer_x / displayed_width).clamp(0.0, 1.0),
        (pointer_y / displayed_height).clamp(0.0, 1.0),
    ))
}

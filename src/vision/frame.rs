//! Frame buffers produced by the depth camera.

use image::{ImageBuffer, Luma, RgbImage};

/// Depth map in millimetres; `0` marks an invalid pixel.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Per-pixel person probability, aligned to the image it was computed on.
pub type PersonMask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Color and depth on the same pixel grid.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub color: RgbImage,
    pub depth: DepthImage,
}

impl FramePair {
    pub fn new(color: RgbImage, depth: DepthImage) -> Self {
        Self { color, depth }
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Whether both images share the same grid.
    pub fn is_aligned(&self) -> bool {
        self.color.dimensions() == self.depth.dimensions()
    }

    /// Depth in metres at `(x, y)`, `None` if invalid or out of bounds.
    pub fn depth_m(&self, x: u32, y: u32) -> Option<f64> {
        match self.depth.get_pixel_checked(x, y) {
            Some(Luma([mm])) if *mm > 0 => Some(*mm as f64 / 1000.0),
            _ => None,
        }
    }
}

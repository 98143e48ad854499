//! Region of interest rectangle and its corner handles.

use serde::{Deserialize, Serialize};

use crate::vision::Point;

/// Default smallest ROI edge in pixels.
pub const MIN_ROI_SIZE: i32 = 50;

/// ROI corner handle, numbered the way the drag logic addresses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// `start` on both axes.
    TopLeft = 0,
    /// `end.x`, `start.y`.
    TopRight = 1,
    /// `start.x`, `end.y`.
    BottomLeft = 2,
    /// `end` on both axes.
    BottomRight = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Axis-aligned `(start, end)` rectangle in frame pixels.
///
/// After [`Roi::clamp`] each edge is at least the minimum size long and both
/// corners lie within `[0, width] x [0, height]` (as long as the frame itself
/// is at least that large).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub start: Point,
    pub end: Point,
}

impl Roi {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Centre-ish ROI used until the operator drags one.
    pub fn default_for_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let mut roi = Roi::new(
            Point::new((0.37 * w) as i32, (0.37 * h) as i32),
            Point::new((0.61 * w) as i32, (0.65 * h) as i32),
        );
        roi.clamp(width, height, MIN_ROI_SIZE);
        roi
    }

    pub fn width(&self) -> i32 {
        self.end.x - self.start.x
    }

    pub fn height(&self) -> i32 {
        self.end.y - self.start.y
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.start,
            Corner::TopRight => Point::new(self.end.x, self.start.y),
            Corner::BottomLeft => Point::new(self.start.x, self.end.y),
            Corner::BottomRight => self.end,
        }
    }

    /// Half-open containment: `start <= p < end`.
    pub fn contains(&self, p: Point) -> bool {
        self.start.x <= p.x && p.x < self.end.x && self.start.y <= p.y && p.y < self.end.y
    }

    /// Move the coordinates owned by `corner` to `p`.
    pub fn set_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => self.start = p,
            Corner::TopRight => {
                self.end.x = p.x;
                self.start.y = p.y;
            }
            Corner::BottomLeft => {
                self.start.x = p.x;
                self.end.y = p.y;
            }
            Corner::BottomRight => self.end = p,
        }
    }

    /// Restore the size and bounds invariant against a `width x height` frame.
    pub fn clamp(&mut self, width: u32, height: u32, min_size: i32) {
        let (sx, ex) = clamp_axis(self.start.x, self.end.x, width as i32, min_size);
        let (sy, ey) = clamp_axis(self.start.y, self.end.y, height as i32, min_size);
        self.start = Point::new(sx, sy);
        self.end = Point::new(ex, ey);
    }
}

fn clamp_axis(start: i32, end: i32, limit: i32, min_size: i32) -> (i32, i32) {
    let start = start.clamp(0, limit);
    let end = end.clamp(0, limit);
    let start = start.min(end - min_size).max(0);
    let end = end.max(start + min_size).min(limit);
    (start, end)
}

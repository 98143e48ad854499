//! Side-view depth profile: where people stand, where focus is requested and
//! where the lens is actually focused.

use std::path::Path;

use image::{ImageResult, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Pixels reserved above the far end of the scale.
const TOP_MARGIN: u32 = 50;
const MARKER_RADIUS: i32 = 2;

const BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
const TRACKED: Rgb<u8> = Rgb([255, 64, 64]);
const UNTRACKED: Rgb<u8> = Rgb([128, 128, 128]);
const LIMIT: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const FOCUS_PLANE: Rgb<u8> = Rgb([0, 255, 0]);

/// Whether a marker belongs to the focus subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Tracked,
    Untracked,
}

/// One sampled pixel of a person, placed by frame column and distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileMarker {
    pub frame_x: u32,
    pub distance_m: f64,
    pub kind: MarkerKind,
}

/// Canvas geometry.
#[derive(Debug, Clone)]
pub struct ProfileLayout {
    pub canvas_height: u32,
    /// Canvas width as a fraction of the frame width.
    pub width_fraction: f64,
    /// Distance drawn at the top margin.
    pub background_m: f64,
    /// Near focus limit of the lens.
    pub near_limit_m: f64,
}

impl Default for ProfileLayout {
    fn default() -> Self {
        Self {
            canvas_height: 900,
            width_fraction: 0.18,
            background_m: 10.0,
            near_limit_m: 0.6,
        }
    }
}

impl ProfileLayout {
    /// Canvas row for a distance. May fall outside the canvas.
    pub fn row(&self, distance_m: f64) -> i32 {
        let scale = self.canvas_height.saturating_sub(TOP_MARGIN) as f64 / self.background_m;
        TOP_MARGIN as i32 + ((self.background_m - distance_m) * scale) as i32
    }

    pub fn canvas_width(&self, frame_width: u32) -> u32 {
        ((frame_width as f64 * self.width_fraction) as u32).max(1)
    }
}

/// Everything one tick contributes to the profile view.
#[derive(Debug, Clone, Default)]
pub struct DepthProfile {
    pub frame_width: u32,
    pub markers: Vec<ProfileMarker>,
    /// Requested focus distance.
    pub focus_distance_m: f64,
    /// Distance the lens is currently focused at.
    pub focus_plane_m: f64,
}

impl DepthProfile {
    pub fn new(frame_width: u32) -> Self {
        Self {
            frame_width,
            ..Default::default()
        }
    }

    /// Add markers for the valid raw depth samples, shifted by a shared
    /// correction offset and the camera offset.
    pub fn add_samples(
        &mut self,
        samples: &[(u32, u32, f64)],
        diff_m: f64,
        camera_offset_m: f64,
        kind: MarkerKind,
    ) {
        let valid = samples.iter().filter(|(_, _, raw)| *raw > 0.0);
        self.markers.extend(valid.map(|&(x, _, raw)| ProfileMarker {
            frame_x: x,
            distance_m: raw - diff_m + camera_offset_m,
            kind,
        }));
    }

    pub fn render(&self, layout: &ProfileLayout) -> RgbImage {
        let width = layout.canvas_width(self.frame_width);
        let height = layout.canvas_height;
        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;

        for marker in &self.markers {
            let x = (marker.frame_x as f64 * width as f64 / self.frame_width.max(1) as f64) as i32;
            let x = x.clamp(0, max_x);
            let y = layout.row(marker.distance_m).clamp(0, max_y);
            let color = match marker.kind {
                MarkerKind::Tracked => TRACKED,
                MarkerKind::Untracked => UNTRACKED,
            };
            let side = (2 * MARKER_RADIUS + 1) as u32;
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(x - MARKER_RADIUS, y - MARKER_RADIUS).of_size(side, side),
                color,
            );
        }

        // Region closer than the lens can focus, crossed out.
        let near = layout.row(layout.near_limit_m);
        let (w, bottom) = (width as f32, height as f32);
        hline(&mut canvas, near, 2, LIMIT);
        hline(&mut canvas, max_y - 1, 2, LIMIT);
        draw_line_segment_mut(&mut canvas, (0.0, bottom), (w, near as f32), LIMIT);
        draw_line_segment_mut(&mut canvas, (0.0, near as f32), (w, bottom), LIMIT);

        hline(&mut canvas, layout.row(self.focus_distance_m), 5, WHITE);
        hline(&mut canvas, layout.row(self.focus_plane_m), 4, FOCUS_PLANE);

        for meters in 0..=layout.background_m as u32 {
            let y = layout.row(meters as f64);
            if (0..height as i32).contains(&y) {
                draw_filled_rect_mut(&mut canvas, Rect::at(0, y).of_size(20.min(width), 1), WHITE);
            }
        }

        canvas
    }

    /// Render with `layout` and write the canvas to `path`. The format
    /// follows the file extension.
    pub fn save_png(&self, layout: &ProfileLayout, path: &Path) -> ImageResult<()> {
        self.render(layout).save(path)
    }
}

/// Full-width horizontal bar of `thickness` rows centred on `y`.
fn hline(canvas: &mut RgbImage, y: i32, thickness: u32, color: Rgb<u8>) {
    let top = y - thickness as i32 / 2;
    let width = canvas.width();
    draw_filled_rect_mut(canvas, Rect::at(0, top).of_size(width, thickness), color);
}

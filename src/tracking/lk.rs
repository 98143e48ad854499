//! Sparse pyramidal Lucas-Kanade optical flow on grayscale images.
//!
//! Each level is the previous one blurred and decimated by two. Points are
//! tracked coarse to fine; the displacement found on one level seeds the next.
//! The spatial gradient matrix is built once per level from the previous image
//! (Scharr derivatives) and the residual is re-sampled in the next image on
//! every iteration.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_scharr, vertical_scharr};

/// Scharr kernel weight sum on one side; dividing by it gives the derivative
/// in intensity units per pixel.
const SCHARR_NORM: f32 = 32.0 * 255.0;

/// Pyramidal LK parameters.
#[derive(Debug, Clone)]
pub struct LkParams {
    /// Square window edge, odd.
    pub win_size: u32,
    /// Highest pyramid level; `0` means no pyramid.
    pub max_level: u32,
    /// Iterations per level.
    pub max_iter: u32,
    /// Stop iterating once an update is shorter than this (pixels).
    pub epsilon: f32,
    /// Reject windows whose smallest gradient-matrix eigenvalue, per window
    /// pixel, falls below this.
    pub min_eigen_threshold: f32,
}

impl Default for LkParams {
    fn default() -> Self {
        Self {
            win_size: 15,
            max_level: 2,
            max_iter: 10,
            epsilon: 0.03,
            min_eigen_threshold: 1e-4,
        }
    }
}

/// Output of [`calc_optical_flow_pyr_lk`], one entry per input point.
#[derive(Debug, Clone, Default)]
pub struct LkResult {
    pub next_pts: Vec<[f32; 2]>,
    pub status: Vec<bool>,
}

impl LkResult {
    /// Tracked positions of the points that succeeded.
    pub fn survivors(&self) -> Vec<[f32; 2]> {
        self.next_pts
            .iter()
            .zip(&self.status)
            .filter(|(_, ok)| **ok)
            .map(|(p, _)| *p)
            .collect()
    }
}

/// Single-channel float plane with clamped bilinear sampling.
struct Plane {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Plane {
    fn from_gray(img: &GrayImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.pixels().map(|p| p[0] as f32 / 255.0).collect(),
        }
    }

    fn from_gradient(img: &ImageBuffer<Luma<i16>, Vec<i16>>) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.pixels().map(|p| p[0] as f32 / SCHARR_NORM).collect(),
        }
    }

    fn in_bounds(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= (self.width - 1) as f32 && y <= (self.height - 1) as f32
    }

    fn at(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;
        let top = self.at(x0, y0) * (1.0 - fx) + self.at(x1, y0) * fx;
        let bottom = self.at(x0, y1) * (1.0 - fx) + self.at(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

struct Level {
    image: Plane,
    gx: Plane,
    gy: Plane,
}

fn pyr_down(img: &GrayImage) -> GrayImage {
    let f: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
            Luma([img.get_pixel(x, y)[0] as f32])
        });
    let blurred = imageproc::filter::gaussian_blur_f32(&f, 1.0);
    let (w, h) = (img.width() / 2, img.height() / 2);
    GrayImage::from_fn(w, h, |x, y| {
        let v = blurred.get_pixel(x * 2, y * 2)[0].clamp(0.0, 255.0);
        Luma([v.round() as u8])
    })
}

fn build_pyramid(img: &GrayImage, params: &LkParams) -> Vec<GrayImage> {
    let mut levels = vec![img.clone()];
    for _ in 0..params.max_level {
        let Some(last) = levels.last() else { break };
        if last.width() / 2 < params.win_size || last.height() / 2 < params.win_size {
            break;
        }
        let down = pyr_down(last);
        levels.push(down);
    }
    levels
}

/// Track `prev_pts` from `prev` into `next`.
///
/// Images of different sizes or smaller than one pixel yield all failures.
/// A point fails when the finest level is ill-conditioned or the tracked
/// position leaves the image; coarser levels that fail just pass their seed
/// through.
pub fn calc_optical_flow_pyr_lk(
    prev: &GrayImage,
    next: &GrayImage,
    prev_pts: &[[f32; 2]],
    params: &LkParams,
) -> LkResult {
    let n = prev_pts.len();
    let mut result = LkResult {
        next_pts: prev_pts.to_vec(),
        status: vec![false; n],
    };
    if prev.dimensions() != next.dimensions() || prev.width() == 0 || prev.height() == 0 {
        return result;
    }

    let prev_pyr = build_pyramid(prev, params);
    let next_pyr = build_pyramid(next, params);
    let levels: Vec<(Level, Plane)> = prev_pyr
        .iter()
        .zip(&next_pyr)
        .map(|(p, q)| {
            let level = Level {
                image: Plane::from_gray(p),
                gx: Plane::from_gradient(&horizontal_scharr(p)),
                gy: Plane::from_gradient(&vertical_scharr(p)),
            };
            (level, Plane::from_gray(q))
        })
        .collect();

    let half = (params.win_size / 2) as i32;
    let window_px = ((2 * half + 1) * (2 * half + 1)) as f32;

    for (i, pt) in prev_pts.iter().enumerate() {
        let mut guess = [0.0f32; 2];
        for (l, (level, next_plane)) in levels.iter().enumerate().rev() {
            let scale = (1u32 << l) as f32;
            let p = [pt[0] / scale, pt[1] / scale];
            let finest = l == 0;

            let mut iw = Vec::with_capacity(window_px as usize);
            let (mut a11, mut a12, mut a22) = (0.0f32, 0.0f32, 0.0f32);
            for wy in -half..=half {
                for wx in -half..=half {
                    let (x, y) = (p[0] + wx as f32, p[1] + wy as f32);
                    let ix = level.gx.sample(x, y);
                    let iy = level.gy.sample(x, y);
                    a11 += ix * ix;
                    a12 += ix * iy;
                    a22 += iy * iy;
                    iw.push((level.image.sample(x, y), ix, iy));
                }
            }

            let det = a11 * a22 - a12 * a12;
            let min_eig = (a11 + a22 - ((a11 - a22).powi(2) + 4.0 * a12 * a12).sqrt())
                / (2.0 * window_px);
            let mut v = [0.0f32; 2];
            let mut ok = min_eig >= params.min_eigen_threshold && det.abs() >= f32::EPSILON;

            if ok {
                for _ in 0..params.max_iter {
                    let q = [p[0] + guess[0] + v[0], p[1] + guess[1] + v[1]];
                    if !next_plane.in_bounds(q[0], q[1]) {
                        ok = false;
                        break;
                    }
                    let (mut b1, mut b2) = (0.0f32, 0.0f32);
                    let mut k = 0;
                    for wy in -half..=half {
                        for wx in -half..=half {
                            let (i0, ix, iy) = iw[k];
                            k += 1;
                            let it = i0 - next_plane.sample(q[0] + wx as f32, q[1] + wy as f32);
                            b1 += it * ix;
                            b2 += it * iy;
                        }
                    }
                    let eta = [(a22 * b1 - a12 * b2) / det, (a11 * b2 - a12 * b1) / det];
                    v[0] += eta[0];
                    v[1] += eta[1];
                    if eta[0] * eta[0] + eta[1] * eta[1] < params.epsilon * params.epsilon {
                        break;
                    }
                }
            }

            if !ok {
                if finest {
                    break;
                }
                guess = [guess[0] * 2.0, guess[1] * 2.0];
                continue;
            }

            let flow = [guess[0] + v[0], guess[1] + v[1]];
            if finest {
                let end = [p[0] + flow[0], p[1] + flow[1]];
                if next_plane.in_bounds(end[0], end[1]) {
                    result.next_pts[i] = end;
                    result.status[i] = true;
                }
            } else {
                guess = [flow[0] * 2.0, flow[1] * 2.0];
            }
        }
    }

    result
}

//! Depth sampling for the face, mask and optical-flow sources.
//!
//! Every function returns an uncorrected distance in metres and uses `0.0`
//! when the region holds no valid depth. Zero stays below every calibration
//! curve, so it passes through correction unchanged.

use image::imageops::{self, FilterType};
use image::Luma;
use rand::Rng;

use crate::vision::{BBox, DepthImage, PersonMask};

/// Mask probability above which a pixel belongs to the person.
const MASK_THRESHOLD: f32 = 0.5;

fn mm_to_m(mm: u16) -> f64 {
    mm as f64 / 1000.0
}

/// Mean of the valid depths in `bbox` (frame coordinates).
pub fn mean_depth_in(depth: &DepthImage, bbox: &BBox) -> f64 {
    let (x1, y1, x2, y2) = bbox.clip(depth.width(), depth.height());
    let mut sum = 0.0;
    let mut count = 0usize;
    for y in y1..y2 {
        for x in x1..x2 {
            let Luma([mm]) = *depth.get_pixel(x, y);
            if mm > 0 {
                sum += mm_to_m(mm);
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Median of a list, averaging the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Median valid depth over square windows around the flow points.
///
/// Points are in ROI-crop coordinates; `roi_origin` maps them to the frame.
/// Each window covers `[x - half, x + half) x [y - half, y + half)`.
pub fn flow_depth_median(
    depth: &DepthImage,
    points: &[[f32; 2]],
    roi_origin: (u32, u32),
    half: u32,
) -> f64 {
    let (w, h) = depth.dimensions();
    let mut samples = Vec::new();
    for p in points {
        let x = p[0] as i64 + roi_origin.0 as i64;
        let y = p[1] as i64 + roi_origin.1 as i64;
        let half = half as i64;
        let x1 = (x - half).clamp(0, w as i64) as u32;
        let x2 = (x + half).clamp(0, w as i64) as u32;
        let y1 = (y - half).clamp(0, h as i64) as u32;
        let y2 = (y + half).clamp(0, h as i64) as u32;
        for yy in y1..y2 {
            for xx in x1..x2 {
                let Luma([mm]) = *depth.get_pixel(xx, yy);
                if mm > 0 {
                    samples.push(mm_to_m(mm));
                }
            }
        }
    }
    median(&mut samples).unwrap_or(0.0)
}

/// Random depth samples from inside a person mask.
#[derive(Debug, Clone, Default)]
pub struct MaskSample {
    /// Sampled pixels in frame coordinates with their raw depth in metres
    /// (`0.0` for invalid pixels).
    pub points: Vec<(u32, u32, f64)>,
    /// Mean of the valid sampled depths, `0.0` if none were valid.
    pub mean_m: f64,
}

/// Draw `max(1, floor(n * ratio))` interior pixels of `mask` without
/// replacement and read their depth.
///
/// `mask` is resized (nearest neighbour) to `crop_size` when it differs.
/// Returns `None` if the mask has no interior pixels.
pub fn sample_mask<R: Rng + ?Sized>(
    mask: &PersonMask,
    crop_size: (u32, u32),
    origin: (u32, u32),
    depth: &DepthImage,
    ratio: f64,
    rng: &mut R,
) -> Option<MaskSample> {
    let resized;
    let mask = if mask.dimensions() == crop_size {
        mask
    } else {
        resized = imageops::resize(mask, crop_size.0, crop_size.1, FilterType::Nearest);
        &resized
    };

    let interior: Vec<(u32, u32)> = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > MASK_THRESHOLD)
        .map(|(x, y, _)| (x, y))
        .collect();
    if interior.is_empty() {
        return None;
    }

    let amount = ((interior.len() as f64 * ratio).floor() as usize).clamp(1, interior.len());
    let mut sample = MaskSample::default();
    let mut sum = 0.0;
    let mut valid = 0usize;
    for idx in rand::seq::index::sample(rng, interior.len(), amount) {
        let (cx, cy) = interior[idx];
        let (x, y) = (cx + origin.0, cy + origin.1);
        let d = depth
            .get_pixel_checked(x, y)
            .map(|Luma([mm])| mm_to_m(*mm))
            .unwrap_or(0.0);
        if d > 0.0 {
            sum += d;
            valid += 1;
        }
        sample.points.push((x, y, d));
    }
    sample.mean_m = if valid == 0 { 0.0 } else { sum / valid as f64 };
    Some(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn depth_with(w: u32, h: u32, f: impl Fn(u32, u32) -> u16) -> DepthImage {
        DepthImage::from_fn(w, h, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_mean_depth_ignores_invalid() {
        let depth = depth_with(10, 10, |x, _| if x < 5 { 0 } else { 2000 });
        assert_eq!(mean_depth_in(&depth, &BBox::new(0.0, 0.0, 10.0, 10.0)), 2.0);
        assert_eq!(mean_depth_in(&depth, &BBox::new(0.0, 0.0, 5.0, 10.0)), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_flow_window_is_ten_by_ten() {
        let depth = depth_with(100, 100, |x, y| {
            if (25..35).contains(&x) && (25..35).contains(&y) {
                1500
            } else {
                4000
            }
        });
        // point (10, 10) in an ROI at (20, 20) is frame (30, 30)
        let d = flow_depth_median(&depth, &[[10.7, 10.2]], (20, 20), 5);
        assert_eq!(d, 1.5);
    }

    #[test]
    fn test_flow_window_clipped_at_border() {
        let depth = depth_with(20, 20, |_, _| 0);
        assert_eq!(flow_depth_median(&depth, &[[0.0, 0.0]], (0, 0), 5), 0.0);
    }

    #[test]
    fn test_sample_mask_size_and_mean() {
        let mask = PersonMask::from_fn(20, 10, |x, _| Luma([if x < 10 { 0.9 } else { 0.1 }]));
        let depth = depth_with(100, 100, |_, _| 3000);
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sample_mask(&mask, (20, 10), (40, 50), &depth, 0.1, &mut rng).unwrap();
        assert_eq!(sample.points.len(), 10);
        assert_eq!(sample.mean_m, 3.0);
        for (x, y, _) in &sample.points {
            assert!((40..50).contains(x) && (50..60).contains(y));
        }
    }

    #[test]
    fn test_sample_mask_takes_at_least_one() {
        let mask = PersonMask::from_pixel(4, 4, Luma([1.0]));
        let depth = depth_with(4, 4, |_, _| 1000);
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_mask(&mask, (4, 4), (0, 0), &depth, 0.001, &mut rng).unwrap();
        assert_eq!(sample.points.len(), 1);
    }

    #[test]
    fn test_sample_mask_resizes_and_handles_empty() {
        let mask = PersonMask::from_pixel(5, 5, Luma([1.0]));
        let depth = depth_with(10, 10, |_, _| 0);
        let mut rng = StdRng::seed_from_u64(3);
        let sample = sample_mask(&mask, (10, 10), (0, 0), &depth, 0.5, &mut rng).unwrap();
        assert_eq!(sample.points.len(), 50);
        assert_eq!(sample.mean_m, 0.0);

        let empty = PersonMask::from_pixel(5, 5, Luma([0.2]));
        assert!(sample_mask(&empty, (5, 5), (0, 0), &depth, 0.5, &mut rng).is_none());
    }
}

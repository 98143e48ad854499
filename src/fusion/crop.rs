//! Person crops with overlapping people blacked out.

use image::{Rgb, RgbImage};

use crate::vision::BBox;

/// Blacked-out share above which the occlusion mask is abandoned.
const MAX_OCCLUDED_RATIO: f64 = 0.5;

/// A crop of the color frame and where it sits in the frame.
#[derive(Debug, Clone)]
pub struct PersonCrop {
    pub image: RgbImage,
    /// Top-left corner in frame pixels.
    pub origin: (u32, u32),
    /// Whether other people's boxes were blacked out.
    pub masked: bool,
}

impl PersonCrop {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Map a box in crop coordinates to frame coordinates.
    pub fn to_frame(&self, bbox: &BBox) -> BBox {
        bbox.translate(self.origin.0 as f32, self.origin.1 as f32)
    }
}

/// Plain crop of `bbox`, `None` if it has no area inside the frame.
pub fn crop_bbox(color: &RgbImage, bbox: &BBox) -> Option<PersonCrop> {
    let (x1, y1, x2, y2) = bbox.clip(color.width(), color.height());
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    let image = image::imageops::crop_imm(color, x1, y1, x2 - x1, y2 - y1).to_image();
    Some(PersonCrop {
        image,
        origin: (x1, y1),
        masked: false,
    })
}

/// Crop `target` and black out every box in `others` that overlaps it.
///
/// When more than half of the crop would be blacked out the unmasked crop is
/// returned instead, so a person mostly hidden behind someone else still gets
/// a usable image.
pub fn occlusion_crop(color: &RgbImage, target: &BBox, others: &[BBox]) -> Option<PersonCrop> {
    let mut crop = crop_bbox(color, target)?;
    let (w, h) = crop.image.dimensions();
    let (ox, oy) = (crop.origin.0 as f32, crop.origin.1 as f32);

    let mut occluded = vec![false; (w * h) as usize];
    for other in others {
        let local = other.translate(-ox, -oy);
        let (x1, y1, x2, y2) = local.clip(w, h);
        for y in y1..y2 {
            for x in x1..x2 {
                occluded[(y * w + x) as usize] = true;
            }
        }
    }

    let blacked = occluded.iter().filter(|o| **o).count();
    if blacked == 0 || blacked as f64 / occluded.len() as f64 > MAX_OCCLUDED_RATIO {
        return Some(crop);
    }

    for (x, y, px) in crop.image.enumerate_pixels_mut() {
        if occluded[(y * w + x) as usize] {
            *px = Rgb([0, 0, 0]);
        }
    }
    crop.masked = true;
    Some(crop)
}

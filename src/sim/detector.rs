//! Color-keyed detector for the synthetic scene.
//!
//! Persons, faces and masks are recovered from the flat palette colors with
//! connected-component labelling, so the detector works on any crop of a
//! rendered frame.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::vision::{BBox, Detector, Face, PersonMask, VisionError};

use super::scene::PALETTES;

#[derive(Debug, Clone)]
pub struct SimDetector {
    /// Components with a smaller box area are ignored (px).
    min_area: f32,
    face_score: f32,
}

impl Default for SimDetector {
    fn default() -> Self {
        Self {
            min_area: 64.0,
            face_score: 0.9,
        }
    }
}

impl SimDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_area(mut self, px: f32) -> Self {
        self.min_area = px;
        self
    }

    fn boxes(&self, labels: &GrayImage) -> Vec<BBox> {
        component_boxes(labels)
            .into_iter()
            .filter(|b| b.area() >= self.min_area)
            .collect()
    }
}

/// `(palette index, is skin)` of a palette-colored pixel.
fn classify(px: &Rgb<u8>) -> Option<(usize, bool)> {
    PALETTES.iter().enumerate().find_map(|(i, p)| {
        if *px == p.body {
            Some((i, false))
        } else if *px == p.skin {
            Some((i, true))
        } else {
            None
        }
    })
}

/// Bounding boxes of the non-zero connected regions, in label order.
fn component_boxes(labels: &GrayImage) -> Vec<BBox> {
    let components: ImageBuffer<Luma<u32>, Vec<u32>> =
        connected_components(labels, Connectivity::Eight, Luma([0u8]));
    let mut bounds: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, p) in components.enumerate_pixels() {
        let label = p[0] as usize;
        if label == 0 {
            continue;
        }
        if bounds.len() < label {
            bounds.resize(label, None);
        }
        let b = &mut bounds[label - 1];
        *b = Some(match *b {
            None => (x, y, x, y),
            Some((x1, y1, x2, y2)) => (x1.min(x), y1.min(y), x2.max(x), y2.max(y)),
        });
    }
    bounds
        .into_iter()
        .flatten()
        .map(|(x1, y1, x2, y2)| {
            BBox::new(x1 as f32, y1 as f32, (x2 + 1) as f32, (y2 + 1) as f32)
        })
        .collect()
}

impl Detector for SimDetector {
    fn detect_person_bboxes(&mut self, image: &RgbImage) -> Result<Vec<BBox>, VisionError> {
        let labels = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([classify(image.get_pixel(x, y)).map_or(0, |(i, _)| i as u8 + 1)])
        });
        Ok(self.boxes(&labels))
    }

    fn detect_faces(&mut self, image: &RgbImage) -> Result<Vec<Face>, VisionError> {
        let labels = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            match classify(image.get_pixel(x, y)) {
                Some((_, true)) => Luma([1]),
                _ => Luma([0]),
            }
        });
        Ok(self
            .boxes(&labels)
            .into_iter()
            .map(|bbox| Face {
                bbox,
                score: self.face_score,
            })
            .collect())
    }

    fn segment_person(&mut self, image: &RgbImage) -> Result<Option<PersonMask>, VisionError> {
        let mut any = false;
        let mask = PersonMask::from_fn(image.width(), image.height(), |x, y| {
            if classify(image.get_pixel(x, y)).is_some() {
                any = true;
                Luma([1.0])
            } else {
                Luma([0.0])
            }
        });
        Ok(any.then_some(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SceneConfig, SyntheticScene};

    fn close(a: &BBox, b: &BBox) -> bool {
        (a.x1 - b.x1).abs() <= 1.0
            && (a.y1 - b.y1).abs() <= 1.0
            && (a.x2 - b.x2).abs() <= 1.0
            && (a.y2 - b.y2).abs() <= 1.0
    }

    #[test]
    fn test_finds_both_people_in_full_frame() {
        let scene = SyntheticScene::new(SceneConfig::default());
        let frame = scene.render(0);
        let mut detector = SimDetector::new();
        let found = detector.detect_person_bboxes(&frame.color).unwrap();
        assert_eq!(found.len(), 2);
        for person in scene.people_at(0) {
            assert!(found.iter().any(|b| close(b, &person.bbox)), "{:?}", person);
        }
    }

    #[test]
    fn test_faces_and_mask_in_person_crop() {
        let scene = SyntheticScene::new(SceneConfig::default());
        let frame = scene.render(0);
        let walker = scene
            .people_at(0)
            .into_iter()
            .find(|p| p.palette == 0)
            .unwrap();
        let (x1, y1, x2, y2) = walker.bbox.clip(frame.width(), frame.height());
        let crop = image::imageops::crop_imm(&frame.color, x1, y1, x2 - x1, y2 - y1).to_image();

        let mut detector = SimDetector::new();
        let faces = detector.detect_faces(&crop).unwrap();
        assert_eq!(faces.len(), 1);
        let face = faces[0].bbox.translate(x1 as f32, y1 as f32);
        assert!(close(&face, &walker.face), "{:?} vs {:?}", face, walker.face);

        let mask = detector.segment_person(&crop).unwrap().unwrap();
        assert_eq!(mask.dimensions(), crop.dimensions());
        let inside = mask.pixels().filter(|p| p[0] == 1.0).count();
        assert!(inside as f64 > 0.9 * (mask.width() * mask.height()) as f64);
    }

    #[test]
    fn test_background_yields_nothing() {
        let background = RgbImage::from_fn(40, 40, |x, _| Rgb([x as u8 * 3; 3]));
        let mut detector = SimDetector::new();
        assert!(detector.detect_person_bboxes(&background).unwrap().is_empty());
        assert!(detector.detect_faces(&background).unwrap().is_empty());
        assert!(detector.segment_person(&background).unwrap().is_none());
    }

    #[test]
    fn test_small_components_are_ignored() {
        let mut image = RgbImage::from_pixel(40, 40, Rgb([10, 10, 10]));
        for y in 0..4 {
            for x in 0..4 {
                image.put_pixel(x, y, PALETTES[0].body);
            }
        }
        let mut detector = SimDetector::new();
        assert!(detector.detect_person_bboxes(&image).unwrap().is_empty());
        let mut lenient = SimDetector::new().with_min_area(1.0);
        assert_eq!(
            lenient.detect_person_bboxes(&image).unwrap(),
            vec![BBox::new(0.0, 0.0, 4.0, 4.0)]
        );
    }
}

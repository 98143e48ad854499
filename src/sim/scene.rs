//! Synthetic two-person scene standing in for the depth camera.
//!
//! A walker crosses the frame while moving towards and away from the camera;
//! a bystander stands still further back. People are painted as flat color
//! blocks (body plus face) over a textured background, and the depth image
//! carries each person's distance on their pixels.

use image::{Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::vision::{BBox, DepthImage, FramePair, FrameSource, VisionError};

/// Body and face colors of one simulated person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub body: Rgb<u8>,
    pub skin: Rgb<u8>,
}

/// Never gray, so never part of the background.
pub const PALETTES: [Palette; 2] = [
    Palette {
        body: Rgb([200, 40, 40]),
        skin: Rgb([235, 190, 160]),
    },
    Palette {
        body: Rgb([40, 70, 200]),
        skin: Rgb([225, 180, 150]),
    },
];

const PERSON_HEIGHT_M: f64 = 1.7;
const CAMERA_HEIGHT_M: f64 = 1.2;
const BACKGROUND_MM: u16 = 8000;

#[derive(Debug, Clone, Copy)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Background pixels on this lattice period have no depth reading.
    pub hole_period: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30.0,
            hole_period: 23,
        }
    }
}

impl SceneConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }
}

/// Ground truth for one person in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimPerson {
    pub bbox: BBox,
    pub face: BBox,
    pub depth_m: f64,
    /// Index into [`PALETTES`].
    pub palette: usize,
}

/// Frame source rendering the scene on demand.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    config: SceneConfig,
    frame_index: u64,
    drop_every: Option<u64>,
}

impl SyntheticScene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            frame_index: 0,
            drop_every: None,
        }
    }

    /// Report no frame pair on every `n`-th call, like a camera missing a
    /// frame deadline.
    pub fn with_drop_every(mut self, n: u64) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Index of the next frame to be produced.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// People visible at `frame_index`, far to near.
    pub fn people_at(&self, frame_index: u64) -> Vec<SimPerson> {
        let t = frame_index as f64 / self.config.fps.max(1.0);
        let w = self.config.width as f64;
        let walker = self.person(
            0,
            0.5 * w + 0.3 * w * (0.8 * t).sin(),
            3.0 + 1.5 * (0.35 * t).sin(),
        );
        let bystander = self.person(1, 0.2 * w, 6.0);
        let mut people = vec![walker, bystander];
        people.sort_by(|a, b| b.depth_m.total_cmp(&a.depth_m));
        people
    }

    fn person(&self, palette: usize, center_x: f64, depth_m: f64) -> SimPerson {
        let h = self.config.height as f64;
        let focal = 0.6 * h;
        let height = focal * PERSON_HEIGHT_M / depth_m;
        let width = 0.35 * height;
        let bottom = 0.5 * h + focal * CAMERA_HEIGHT_M / depth_m;
        let top = bottom - height;
        let face_width = 0.4 * width;
        SimPerson {
            bbox: BBox::new(
                (center_x - width / 2.0) as f32,
                top as f32,
                (center_x + width / 2.0) as f32,
                bottom as f32,
            ),
            face: BBox::new(
                (center_x - face_width / 2.0) as f32,
                (top + 0.03 * height) as f32,
                (center_x + face_width / 2.0) as f32,
                (top + 0.16 * height) as f32,
            ),
            depth_m,
            palette,
        }
    }

    pub fn render(&self, frame_index: u64) -> FramePair {
        let (w, h) = (self.config.width, self.config.height);
        let mut color = RgbImage::from_fn(w, h, |x, y| {
            let v = 128.0 + 40.0 * (0.25 * x as f32).sin() + 40.0 * (0.2 * y as f32 + 0.5).sin();
            let v = v.round() as u8;
            Rgb([v, v, v])
        });
        let hole = self.config.hole_period.max(1);
        let mut depth = DepthImage::from_fn(w, h, |x, y| {
            if (x * 7 + y * 13) % hole == 0 {
                Luma([0])
            } else {
                Luma([BACKGROUND_MM])
            }
        });

        for person in self.people_at(frame_index) {
            let palette = PALETTES[person.palette % PALETTES.len()];
            let mm = Luma([(person.depth_m * 1000.0).round() as u16]);
            if let Some(rect) = to_rect(&person.bbox) {
                draw_filled_rect_mut(&mut color, rect, palette.body);
                draw_filled_rect_mut(&mut depth, rect, mm);
            }
            if let Some(rect) = to_rect(&person.face) {
                draw_filled_rect_mut(&mut color, rect, palette.skin);
            }
        }
        FramePair::new(color, depth)
    }
}

impl FrameSource for SyntheticScene {
    fn aligned_frames(&mut self) -> Result<Option<FramePair>, VisionError> {
        let index = self.frame_index;
        self.frame_index += 1;
        if let Some(n) = self.drop_every {
            if index % n == n - 1 {
                tracing::trace!("Simulated frame {} dropped", index);
                return Ok(None);
            }
        }
        Ok(Some(self.render(index)))
    }
}

fn to_rect(bbox: &BBox) -> Option<Rect> {
    let w = bbox.width().round() as u32;
    let h = bbox.height().round() as u32;
    (w > 0 && h > 0)
        .then(|| Rect::at(bbox.x1.round() as i32, bbox.y1.round() as i32).of_size(w, h))
}

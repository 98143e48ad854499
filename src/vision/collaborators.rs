//! Interfaces to the camera, the inference engine and the multi-object
//! tracker. The control loop only sees these traits.

use image::RgbImage;
use thiserror::Error;

use super::frame::{FramePair, PersonMask};
use super::geometry::{BBox, Face, Track};

/// Collaborator failures.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Frame source error: {0}")]
    Source(String),
    #[error("Detector error: {0}")]
    Detector(String),
    #[error("Tracker error: {0}")]
    Tracker(String),
}

/// Aligned color + depth frames, once per tick.
pub trait FrameSource {
    /// `Ok(None)` when no frame pair is available this tick.
    fn aligned_frames(&mut self) -> Result<Option<FramePair>, VisionError>;
}

/// Person, face and segmentation inference.
pub trait Detector {
    fn detect_person_bboxes(&mut self, image: &RgbImage) -> Result<Vec<BBox>, VisionError>;

    /// Faces already filtered by the detector's score threshold.
    fn detect_faces(&mut self, image: &RgbImage) -> Result<Vec<Face>, VisionError>;

    /// Person mask aligned to `image`, if anyone was segmented.
    fn segment_person(&mut self, image: &RgbImage) -> Result<Option<PersonMask>, VisionError>;
}

/// Tracking-by-detection: assigns stable ids to per-tick boxes.
pub trait Tracker {
    fn update(&mut self, detections: &[BBox]) -> Result<Vec<Track>, VisionError>;
}

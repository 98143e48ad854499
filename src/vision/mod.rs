//! Frames, geometry and the vision collaborators consumed by the control loop.

mod collaborators;
mod frame;
mod geometry;

pub use collaborators::{Detector, FrameSource, Tracker, VisionError};
pub use frame::{DepthImage, FramePair, PersonMask};
pub use geometry::{BBox, Face, Point, Track, TrackId};

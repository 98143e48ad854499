//! Simulated rig: a synthetic scene with detector and tracker to match, for
//! running the control loop without a camera or inference engine.

mod detector;
mod scene;
mod tracker;

pub use detector::SimDetector;
pub use scene::{Palette, SceneConfig, SimPerson, SyntheticScene, PALETTES};
pub use tracker::IouTracker;

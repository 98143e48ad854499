//! Focus control loop: ties vision, fusion and the motor together.

mod config;
mod controller;
mod report;

pub use config::ControlConfig;
pub use controller::{ControlError, FocusController, VisionStack};
pub use report::{FocusSource, FpsCounter, TickReport};

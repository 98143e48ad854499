// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Focus Puller
//!
//! Depth-camera autofocus for a stepper-driven follow focus.
//!
//! Every control tick takes an aligned color + depth frame pair, finds the
//! subject the operator picked (a tracked person, or an arbitrary point
//! followed with optical flow), turns its depth into a calibrated focus
//! distance and sends the matching motor position to a worker thread that
//! drives the stepper.
//!
//! ## Example
//!
//! ```rust,no_run
//! use focus_puller::sim::{IouTracker, SceneConfig, SimDetector, SyntheticScene};
//! use focus_puller::{
//!     ControlConfig, DryRunActuator, FocusController, LightingCondition, MotorConfig,
//!     MotorController, MotorLut, VisionStack, DEFAULT_SHUTDOWN_TIMEOUT,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let motor = MotorController::spawn(DryRunActuator::new(), MotorConfig::default())?;
//!     let vision = VisionStack {
//!         source: Box::new(SyntheticScene::new(SceneConfig::default())),
//!         detector: Box::new(SimDetector::new()),
//!         tracker: Box::new(IouTracker::new()),
//!     };
//!     let mut controller = FocusController::new(
//!         ControlConfig::default().with_ramp_time(1.0),
//!         LightingCondition::IndoorGood.curve(),
//!         MotorLut::builtin(),
//!         vision,
//!         motor,
//!     );
//!
//!     for _ in 0..30 {
//!         if let Some(report) = controller.tick()? {
//!             println!("focus at {:.2} m", report.focus_distance_m);
//!         }
//!     }
//!     controller.shutdown(DEFAULT_SHUTDOWN_TIMEOUT)?;
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod control;
pub mod fusion;
pub mod motor;
pub mod selection;
pub mod settings;
pub mod sim;
pub mod tracking;
pub mod vision;

pub use calibration::{correct_distance, CalibrationCurve, CalibrationError, LightingCondition};

pub use control::{
    ControlConfig, ControlError, FocusController, FocusSource, FpsCounter, TickReport,
    VisionStack,
};

pub use motor::{
    Actuator, DryRunActuator, MotorConfig, MotorController, MotorError, MotorLink, MotorLut,
    MoveCommand, DEFAULT_SHUTDOWN_TIMEOUT,
};

pub use selection::{Roi, TargetAcquisition, TargetSelection};
pub use settings::{AppSettings, SettingsError};
pub use vision::{Detector, FramePair, FrameSource, Tracker, VisionError};

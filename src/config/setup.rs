//! Rig setup checklist that must be completed before focusing starts.
//!
//! The motor counts steps relative to wherever the focus ring was when it was
//! attached, so the ring has to sit at its minimum focus distance (step 0 in
//! the motor table) before the control loop may drive it.

use thiserror::Error;

use crate::calibration::LightingCondition;

/// Setup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Setup incomplete: {0}")]
    Incomplete(&'static str),
}

/// Operator confirmations gathered before the session starts.
#[derive(Debug, Clone, Default)]
pub struct SetupChecklist {
    min_focus_set: bool,
    motor_mounted: bool,
    lighting: Option<LightingCondition>,
}

impl SetupChecklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus ring turned to minimum focus distance.
    pub fn confirm_min_focus(&mut self, done: bool) {
        self.min_focus_set = done;
    }

    /// Stepper attached to the focus ring.
    pub fn confirm_motor_mounted(&mut self, done: bool) {
        self.motor_mounted = done;
    }

    pub fn select_lighting(&mut self, lighting: LightingCondition) {
        self.lighting = Some(lighting);
    }

    pub fn is_complete(&self) -> bool {
        self.min_focus_set && self.motor_mounted && self.lighting.is_some()
    }

    /// Consume the checklist and return the chosen lighting condition.
    pub fn finish(self) -> Result<LightingCondition, SetupError> {
        if !self.min_focus_set {
            return Err(SetupError::Incomplete("focus ring not at minimum focus"));
        }
        if !self.motor_mounted {
            return Err(SetupError::Incomplete("motor not mounted"));
        }
        self.lighting
            .ok_or(SetupError::Incomplete("no lighting condition selected"))
    }
}

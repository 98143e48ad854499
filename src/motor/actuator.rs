//! Stepping primitive below the motor worker.

use thiserror::Error;

/// Actuator hardware errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("Step failed: {0}")]
    Step(String),
    #[error("Release failed: {0}")]
    Release(String),
}

/// Step direction. `Forward` moves the lens towards infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Direction that moves the counter by `delta`. Zero maps to `Forward`.
    pub fn of(delta: i32) -> Self {
        if delta < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    /// Change to the step counter for one step in this direction.
    pub fn sign(&self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// A physical stepper driver.
///
/// Only the motor worker thread ever holds an actuator, so implementations
/// need `Send` but not `Sync`.
pub trait Actuator: Send {
    /// Advance exactly one step.
    fn step(&mut self, direction: Direction) -> Result<(), ActuatorError>;

    /// De-energize the coils.
    fn release(&mut self) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn step(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        (**self).step(direction)
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        (**self).release()
    }
}

/// Actuator that only logs, for running without a motor attached.
#[derive(Debug, Default)]
pub struct DryRunActuator {
    position: i64,
}

impl DryRunActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> i64 {
        self.position
    }
}

impl Actuator for DryRunActuator {
    fn step(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        self.position += direction.sign() as i64;
        tracing::trace!("dry-run step {:?} -> {}", direction, self.position);
        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        tracing::debug!("dry-run actuator released at {}", self.position);
        Ok(())
    }
}

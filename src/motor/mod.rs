//! Focus motor: step/distance lookup, the worker thread that owns the
//! stepper, and the gate that decides which distances become moves.

mod actuator;
mod controller;
mod gate;
mod lut;

pub use actuator::{Actuator, ActuatorError, Direction, DryRunActuator};
pub use controller::{
    HomingGuard, MotorConfig, MotorController, MotorError, MotorLink, MoveCommand,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use gate::FocusGate;
pub use lut::{MotorLut, MotorLutLoadError};

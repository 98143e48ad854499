//! Hysteresis and focus-lock gating for motor commands.

use super::controller::MoveCommand;

/// Decides when a new focus distance is worth a motor move, and how fast.
///
/// A move is issued only when the distance differs from the last committed
/// one by more than the hysteresis threshold. Until the motor has once come
/// within one step of its target the configured ramp time is used; after that
/// moves use the fast focus time. Both pieces of state are cleared by
/// [`FocusGate::reset`] whenever the operator picks a new target.
#[derive(Debug, Clone)]
pub struct FocusGate {
    hysteresis_m: f64,
    ramp_time: f64,
    fast_time: f64,
    last_committed: Option<f64>,
    locked_once: bool,
}

impl FocusGate {
    pub fn new(hysteresis_m: f64, ramp_time: f64, fast_time: f64) -> Self {
        Self {
            hysteresis_m,
            ramp_time,
            fast_time,
            last_committed: None,
            locked_once: false,
        }
    }

    pub fn set_ramp_time(&mut self, seconds: f64) {
        self.ramp_time = seconds.max(0.0);
    }

    pub fn ramp_time(&self) -> f64 {
        self.ramp_time
    }

    pub fn is_locked(&self) -> bool {
        self.locked_once
    }

    pub fn last_committed(&self) -> Option<f64> {
        self.last_committed
    }

    /// Record the motor position against the current target.
    ///
    /// Returns `true` on the tick the lock is first reached.
    pub fn observe(&mut self, target_steps: i32, current_steps: i32) -> bool {
        if self.locked_once || (target_steps - current_steps).abs() > 1 {
            return false;
        }
        self.locked_once = true;
        tracing::debug!("Focus locked at {} steps", current_steps);
        true
    }

    /// The move to issue for `distance_m`, if any. Nothing is recorded until
    /// [`FocusGate::commit`] is called.
    pub fn plan(&self, distance_m: f64, target_steps: i32) -> Option<MoveCommand> {
        if let Some(last) = self.last_committed {
            if (distance_m - last).abs() <= self.hysteresis_m {
                return None;
            }
        }
        let focus_time = if self.locked_once {
            self.fast_time
        } else {
            self.ramp_time
        };
        Some(MoveCommand {
            target_steps,
            focus_time,
        })
    }

    /// Mark `distance_m` as sent to the motor.
    pub fn commit(&mut self, distance_m: f64) {
        self.last_committed = Some(distance_m);
    }

    pub fn reset(&mut self) {
        self.last_committed = None;
        self.locked_once = false;
    }
}

//! Motor worker thread.
//!
//! The worker is the only owner of the actuator. The control loop talks to it
//! through a single-slot mailbox (a newer move replaces a pending one) and
//! reads the step counter, which only the worker writes.
//!
//! Homing is tied to the lifetime of [`HomingGuard`], so it runs whether the
//! worker loop returns because of a stop request or unwinds from a panic.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use super::actuator::{Actuator, Direction};

/// Grace period added on top of the homing time when stopping the worker.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Motor worker errors.
#[derive(Error, Debug)]
pub enum MotorError {
    #[error("Motor worker is not running")]
    WorkerStopped,
    #[error("Motor command mailbox is poisoned")]
    MailboxPoisoned,
    #[error("Failed to spawn motor worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Motor worker panicked")]
    WorkerPanicked,
}

/// Timing for the motor worker.
#[derive(Debug, Clone)]
pub struct MotorConfig {
    /// Shortest step period (maximum speed).
    pub max_speed_period: Duration,
    /// Step period while homing.
    pub homing_period: Duration,
    /// Sleep between mailbox checks while idle.
    pub idle_poll: Duration,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_speed_period: Duration::from_millis(1),
            homing_period: Duration::from_millis(10),
            idle_poll: Duration::from_millis(10),
        }
    }
}

impl MotorConfig {
    /// Set the maximum-speed step period.
    pub fn with_max_speed_period(mut self, period: Duration) -> Self {
        self.max_speed_period = period;
        self
    }

    /// Set the homing step period.
    pub fn with_homing_period(mut self, period: Duration) -> Self {
        self.homing_period = period;
        self
    }

    /// Set the idle poll period.
    pub fn with_idle_poll(mut self, period: Duration) -> Self {
        self.idle_poll = period;
        self
    }
}

/// A move request for the worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    /// Absolute step position to reach.
    pub target_steps: i32,
    /// Seconds the whole move should take; `0.0` means as fast as possible.
    pub focus_time: f64,
}

/// What the control loop needs from the motor subsystem.
pub trait MotorLink {
    /// Replace any pending move with `command`.
    fn enqueue_move(&self, command: MoveCommand) -> Result<(), MotorError>;

    /// Current step position as last reported by the worker.
    fn current_steps(&self) -> i32;

    /// Stop the motor and wait for it to home. `grace` is added to the
    /// expected homing time before a slow shutdown is reported.
    fn shutdown(&mut self, grace: Duration) -> Result<(), MotorError>;
}

#[derive(Default)]
struct Mailbox {
    slot: Mutex<Option<MoveCommand>>,
}

impl Mailbox {
    fn put(&self, command: MoveCommand) -> Result<(), MotorError> {
        let mut slot = self.slot.lock().map_err(|_| MotorError::MailboxPoisoned)?;
        *slot = Some(command);
        Ok(())
    }

    fn take(&self) -> Option<MoveCommand> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

/// Owns the actuator on the worker thread and homes it when dropped.
///
/// On drop the guard steps back to position 0 at the homing period, updating
/// the shared counter as it goes, then releases the actuator exactly once.
/// Actuator errors during homing are logged and end the homing early; release
/// is still attempted.
pub struct HomingGuard<A: Actuator> {
    actuator: A,
    position: Arc<AtomicI32>,
    homing_period: Duration,
    done: Option<Sender<()>>,
}

impl<A: Actuator> HomingGuard<A> {
    pub fn new(actuator: A, position: Arc<AtomicI32>, homing_period: Duration) -> Self {
        Self {
            actuator,
            position,
            homing_period,
            done: None,
        }
    }

    /// Signal `done` once homing and release have finished.
    pub fn with_done_signal(mut self, done: Sender<()>) -> Self {
        self.done = Some(done);
        self
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    fn drive_home(&mut self) {
        let start = self.position.load(Ordering::SeqCst);
        if start == 0 {
            return;
        }
        tracing::info!("Homing motor from {} steps", start);
        let direction = Direction::of(-start);
        for _ in 0..start.unsigned_abs() {
            if let Err(e) = self.actuator.step(direction) {
                tracing::warn!("Homing step failed: {}", e);
                return;
            }
            self.position.fetch_add(direction.sign(), Ordering::SeqCst);
            thread::sleep(self.homing_period);
        }
    }
}

impl<A: Actuator> Drop for HomingGuard<A> {
    fn drop(&mut self) {
        if panic::catch_unwind(AssertUnwindSafe(|| self.drive_home())).is_err() {
            tracing::error!("Actuator panicked while homing");
        }
        if let Err(e) = self.actuator.release() {
            tracing::warn!("Actuator release failed: {}", e);
        }
        tracing::info!(
            "Motor released at {} steps",
            self.position.load(Ordering::SeqCst)
        );
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

/// Per-step delay for a move of `steps` steps that should last `focus_time`.
fn step_delay(focus_time: f64, steps: u32, min_period: Duration) -> Duration {
    if focus_time.is_nan() || focus_time <= 0.0 || steps == 0 {
        return min_period;
    }
    Duration::try_from_secs_f64(focus_time / steps as f64)
        .unwrap_or(Duration::MAX)
        .max(min_period)
}

fn run_worker<A: Actuator>(
    guard: &mut HomingGuard<A>,
    mailbox: &Mailbox,
    stop: &AtomicBool,
    config: &MotorConfig,
) {
    while !stop.load(Ordering::SeqCst) {
        let Some(command) = mailbox.take() else {
            thread::sleep(config.idle_poll);
            continue;
        };

        let current = guard.position.load(Ordering::SeqCst);
        let delta = command.target_steps - current;
        if delta == 0 {
            continue;
        }

        let direction = Direction::of(delta);
        let steps = delta.unsigned_abs();
        let delay = step_delay(command.focus_time, steps, config.max_speed_period);
        tracing::debug!(
            "Moving {} steps {:?} to {} ({:?}/step)",
            steps,
            direction,
            command.target_steps,
            delay
        );

        for _ in 0..steps {
            if stop.load(Ordering::SeqCst) || mailbox.is_pending() {
                break;
            }
            if let Err(e) = guard.actuator_mut().step(direction) {
                tracing::warn!("Motor step failed, abandoning move: {}", e);
                break;
            }
            let previous = guard.position.fetch_add(direction.sign(), Ordering::SeqCst);
            tracing::trace!("Motor at {} steps", previous + direction.sign());
            thread::sleep(delay);
        }
    }
}

/// Handle to the motor worker thread.
pub struct MotorController {
    position: Arc<AtomicI32>,
    stop: Arc<AtomicBool>,
    mailbox: Arc<Mailbox>,
    done_rx: Receiver<()>,
    homing_period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl MotorController {
    /// Start the worker. The actuator is moved onto the worker thread and the
    /// current lens position is taken as step 0.
    pub fn spawn<A: Actuator + 'static>(actuator: A, config: MotorConfig) -> Result<Self, MotorError> {
        let position = Arc::new(AtomicI32::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let mailbox = Arc::new(Mailbox::default());
        let (done_tx, done_rx) = mpsc::channel();

        let worker_position = Arc::clone(&position);
        let worker_stop = Arc::clone(&stop);
        let worker_mailbox = Arc::clone(&mailbox);
        let homing_period = config.homing_period;

        let handle = thread::Builder::new()
            .name("focus-motor".to_string())
            .spawn(move || {
                tracing::info!("Motor worker started");
                let mut guard = HomingGuard::new(actuator, worker_position, config.homing_period)
                    .with_done_signal(done_tx);
                run_worker(&mut guard, &worker_mailbox, &worker_stop, &config);
                tracing::info!("Motor worker stopping");
            })?;

        Ok(Self {
            position,
            stop,
            mailbox,
            done_rx,
            homing_period,
            handle: Some(handle),
        })
    }

    fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the worker to stop and home. Returns immediately.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Time homing needs from the current position, plus `grace`.
    fn homing_budget(&self, grace: Duration) -> Duration {
        let steps = self.position.load(Ordering::SeqCst).unsigned_abs();
        self.homing_period
            .saturating_mul(steps)
            .saturating_add(grace)
    }

    /// Stop the worker and block until it has homed and released the
    /// actuator.
    ///
    /// The expected homing time is derived from the current position and
    /// `grace` is added on top. If the worker overruns that, a warning is
    /// logged and the call keeps waiting: the thread is always joined.
    pub fn stop(&mut self, grace: Duration) -> Result<(), MotorError> {
        self.request_stop();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let budget = self.homing_budget(grace);
        if let Err(RecvTimeoutError::Timeout) = self.done_rx.recv_timeout(budget) {
            tracing::warn!(
                "Motor still homing after {:?} at {} steps, waiting",
                budget,
                self.position.load(Ordering::SeqCst)
            );
        }

        handle.join().map_err(|_| MotorError::WorkerPanicked)?;
        tracing::info!("Motor worker stopped");
        Ok(())
    }
}

impl MotorLink for MotorController {
    fn enqueue_move(&self, command: MoveCommand) -> Result<(), MotorError> {
        if !self.is_running() {
            return Err(MotorError::WorkerStopped);
        }
        self.mailbox.put(command)
    }

    fn current_steps(&self) -> i32 {
        self.position.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self, grace: Duration) -> Result<(), MotorError> {
        self.stop(grace)
    }
}

impl Drop for MotorController {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop(DEFAULT_SHUTDOWN_TIMEOUT) {
                tracing::warn!("Motor shutdown on drop: {}", e);
            }
        }
    }
}

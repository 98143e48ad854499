//! Per-tick telemetry.

use std::collections::VecDeque;
use std::time::Instant;

use crate::fusion::{median, DepthProfile};
use crate::motor::MoveCommand;
use crate::selection::{Roi, TargetSelection};
use crate::vision::Track;

/// Which source set the focus distance this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusSource {
    Face { raw_m: f64, corrected_m: f64 },
    Mask { raw_m: f64, corrected_m: f64 },
    Flow { raw_m: f64, corrected_m: f64 },
}

impl FocusSource {
    pub fn name(&self) -> &'static str {
        match self {
            FocusSource::Face { .. } => "face",
            FocusSource::Mask { .. } => "mask",
            FocusSource::Flow { .. } => "flow",
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub roi: Roi,
    pub tracks: Vec<Track>,
    pub selection: TargetSelection,
    /// `None` when the focus distance was carried over from an earlier tick.
    pub source: Option<FocusSource>,
    pub focus_distance_m: f64,
    pub target_steps: i32,
    pub current_steps: i32,
    /// Move sent to the motor this tick.
    pub command: Option<MoveCommand>,
    pub locked: bool,
    pub profile: DepthProfile,
}

/// Frame rate smoothed as the median of the last few tick rates.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last: Option<Instant>,
    history: VecDeque<f64>,
    capacity: usize,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FpsCounter {
    pub fn new(capacity: usize) -> Self {
        Self {
            last: None,
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a tick at `now` and return the smoothed rate.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let fps = match self.last {
            Some(prev) => {
                let dt = now.duration_since(prev).as_secs_f64();
                if dt > 0.0 {
                    1.0 / dt
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last = Some(now);
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(fps);
        let mut values: Vec<f64> = self.history.iter().copied().collect();
        median(&mut values).unwrap_or(0.0)
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fps_median() {
        let mut fps = FpsCounter::new(3);
        let t0 = Instant::now();
        assert_eq!(fps.tick_at(t0), 0.0);
        fps.tick_at(t0 + Duration::from_millis(100));
        fps.tick_at(t0 + Duration::from_millis(200));
        // history [10, 10, 10] after the zero is pushed out
        let smoothed = fps.tick_at(t0 + Duration::from_millis(300));
        assert!((smoothed - 10.0).abs() < 1e-6);
    }
}

//! Bidirectional step/distance lookup for the focus motor.
//!
//! Each entry pairs a motor step index with the focus distance the lens sits
//! at after that many steps from minimum focus. Both columns are strictly
//! ascending.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::CalibrationError;
use crate::config::MOTOR_LUT_TABLE;

static DEFAULT_LUT: Lazy<Arc<MotorLut>> = Lazy::new(|| {
    Arc::new(MotorLut {
        entries: MOTOR_LUT_TABLE.to_vec(),
    })
});

/// Motor calibration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(i32, f64)>", into = "Vec<(i32, f64)>")]
pub struct MotorLut {
    entries: Vec<(i32, f64)>,
}

impl MotorLut {
    /// Build a table from `(steps, distance_m)` pairs.
    pub fn new(entries: Vec<(i32, f64)>) -> Result<Self, CalibrationError> {
        if entries.is_empty() {
            return Err(CalibrationError::Empty);
        }
        for (i, pair) in entries.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(CalibrationError::NotAscending {
                    column: "steps",
                    index: i + 1,
                });
            }
            if pair[1].1 <= pair[0].1 || pair[1].1.is_nan() {
                return Err(CalibrationError::NotAscending {
                    column: "distance",
                    index: i + 1,
                });
            }
        }
        Ok(Self { entries })
    }

    /// The table shipped with the rig.
    pub fn builtin() -> Arc<MotorLut> {
        DEFAULT_LUT.clone()
    }

    /// Load an override table from a JSON file of `[steps, distance_m]` pairs.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MotorLutLoadError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn entries(&self) -> &[(i32, f64)] {
        &self.entries
    }

    /// Distance range covered by the table.
    pub fn distance_range(&self) -> (f64, f64) {
        let first = self.entries[0].1;
        let last = self.entries[self.entries.len() - 1].1;
        (first, last)
    }

    /// Step index for a focus distance, truncated towards zero.
    ///
    /// Distances outside the table clamp to the first/last step.
    pub fn distance_to_steps(&self, distance_m: f64) -> i32 {
        let pos = self.entries.partition_point(|&(_, d)| d < distance_m);
        if pos == 0 {
            return self.entries[0].0;
        }
        if pos == self.entries.len() {
            return self.entries[pos - 1].0;
        }
        let (s0, d0) = self.entries[pos - 1];
        let (s1, d1) = self.entries[pos];
        let t = (distance_m - d0) / (d1 - d0);
        (s0 as f64 + t * (s1 - s0) as f64) as i32
    }

    /// Focus distance for a step index, interpolated.
    pub fn steps_to_distance(&self, steps: i32) -> f64 {
        let pos = self.entries.partition_point(|&(s, _)| s < steps);
        if pos == 0 {
            return self.entries[0].1;
        }
        if pos == self.entries.len() {
            return self.entries[pos - 1].1;
        }
        let (s0, d0) = self.entries[pos - 1];
        let (s1, d1) = self.entries[pos];
        let t = (steps - s0) as f64 / (s1 - s0) as f64;
        d0 + t * (d1 - d0)
    }
}

impl TryFrom<Vec<(i32, f64)>> for MotorLut {
    type Error = CalibrationError;

    fn try_from(entries: Vec<(i32, f64)>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<MotorLut> for Vec<(i32, f64)> {
    fn from(lut: MotorLut) -> Self {
        lut.entries
    }
}

/// Errors loading a motor table override.
#[derive(Error, Debug)]
pub enum MotorLutLoadError {
    #[error("Failed to read motor table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid motor table: {0}")]
    Json(#[from] serde_json::Error),
}

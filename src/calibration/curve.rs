//! Lighting-dependent measured-to-true distance curves.
//!
//! The depth camera's bias depends on ambient light, so the rig ships four
//! curves recorded under different conditions. One is chosen per session and
//! never changes afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::tables::{
    INSIDE_BAD_LIGHTING, INSIDE_GOOD_LIGHTING, OUTSIDE_BAD_LIGHTING, OUTSIDE_GOOD_LIGHTING,
    TRUE_DISTANCES_M,
};

/// Distance returned for readings at or beyond the last measured sample.
pub const FAR_CEILING_M: f64 = 10.0;

/// Calibration data errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration table is empty")]
    Empty,
    #[error("Calibration columns differ in length: {measured} measured vs {truth} true")]
    LengthMismatch { measured: usize, truth: usize },
    #[error("Calibration column '{column}' is not ascending at index {index}")]
    NotAscending { column: &'static str, index: usize },
    #[error("Unknown lighting condition: {0}")]
    UnknownLighting(String),
}

/// Lighting condition selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightingCondition {
    IndoorGood,
    /// Fallback when nothing usable was selected.
    #[default]
    IndoorBad,
    OutdoorGood,
    OutdoorBad,
}

impl LightingCondition {
    pub const ALL: [LightingCondition; 4] = [
        LightingCondition::IndoorGood,
        LightingCondition::IndoorBad,
        LightingCondition::OutdoorGood,
        LightingCondition::OutdoorBad,
    ];

    /// Short machine key, e.g. `indoor-bad`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::IndoorGood => "indoor-good",
            Self::IndoorBad => "indoor-bad",
            Self::OutdoorGood => "outdoor-good",
            Self::OutdoorBad => "outdoor-bad",
        }
    }

    /// Label shown in the rig's setup dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IndoorGood => "Drinnen - Gutes Licht",
            Self::IndoorBad => "Drinnen - Schlechtes Licht",
            Self::OutdoorGood => "Draußen - Gutes Licht",
            Self::OutdoorBad => "Draußen - Schlechtes Licht",
        }
    }

    /// Parse a key or dropdown label, falling back to [`LightingCondition::IndoorBad`].
    pub fn from_label_or_default(label: Option<&str>) -> Self {
        label.and_then(|l| l.parse().ok()).unwrap_or_default()
    }

    /// The built-in curve measured under this condition.
    pub fn curve(&self) -> Arc<CalibrationCurve> {
        let curve: &Lazy<Arc<CalibrationCurve>> = match self {
            Self::IndoorGood => &INDOOR_GOOD,
            Self::IndoorBad => &INDOOR_BAD,
            Self::OutdoorGood => &OUTDOOR_GOOD,
            Self::OutdoorBad => &OUTDOOR_BAD,
        };
        Arc::clone(curve)
    }
}

impl fmt::Display for LightingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LightingCondition {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(trimmed) || c.label() == trimmed)
            .ok_or_else(|| CalibrationError::UnknownLighting(trimmed.to_string()))
    }
}

static INDOOR_GOOD: Lazy<Arc<CalibrationCurve>> =
    Lazy::new(|| Arc::new(CalibrationCurve::from_static(&INSIDE_GOOD_LIGHTING)));
static INDOOR_BAD: Lazy<Arc<CalibrationCurve>> =
    Lazy::new(|| Arc::new(CalibrationCurve::from_static(&INSIDE_BAD_LIGHTING)));
static OUTDOOR_GOOD: Lazy<Arc<CalibrationCurve>> =
    Lazy::new(|| Arc::new(CalibrationCurve::from_static(&OUTSIDE_GOOD_LIGHTING)));
static OUTDOOR_BAD: Lazy<Arc<CalibrationCurve>> =
    Lazy::new(|| Arc::new(CalibrationCurve::from_static(&OUTSIDE_BAD_LIGHTING)));

/// Measured-to-true distance curve.
///
/// `measured[i]` pairs with `truth[i]`. The measured column may repeat a value
/// (lookups use the first index not below the query, so equal neighbours are
/// never both bracketing entries); the true column is strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    measured: Vec<f64>,
    truth: Vec<f64>,
}

impl CalibrationCurve {
    /// Build a curve, validating length and ordering.
    pub fn new(measured: Vec<f64>, truth: Vec<f64>) -> Result<Self, CalibrationError> {
        if measured.is_empty() {
            return Err(CalibrationError::Empty);
        }
        if measured.len() != truth.len() {
            return Err(CalibrationError::LengthMismatch {
                measured: measured.len(),
                truth: truth.len(),
            });
        }
        if let Some(index) = measured.windows(2).position(|w| w[1] < w[0]) {
            return Err(CalibrationError::NotAscending {
                column: "measured",
                index: index + 1,
            });
        }
        if let Some(index) = truth.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CalibrationError::NotAscending {
                column: "true",
                index: index + 1,
            });
        }
        Ok(Self { measured, truth })
    }

    fn from_static(measured: &[f64]) -> Self {
        Self {
            measured: measured.to_vec(),
            truth: TRUE_DISTANCES_M.to_vec(),
        }
    }

    pub fn measured(&self) -> &[f64] {
        &self.measured
    }

    pub fn truth(&self) -> &[f64] {
        &self.truth
    }

    pub fn len(&self) -> usize {
        self.measured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    /// Correct a measured distance. See [`correct_distance`].
    pub fn correct(&self, measured_m: f64) -> f64 {
        correct_distance(measured_m, self)
    }
}

/// Map a measured depth-camera distance onto the true distance.
///
/// - below the first measured sample: returned unchanged (near-field readings
///   are taken as unbiased)
/// - at or above the last sample: [`FAR_CEILING_M`], the end of the rig's
///   usable range
/// - otherwise: linear interpolation between the bracketing true values
pub fn correct_distance(measured_m: f64, curve: &CalibrationCurve) -> f64 {
    let measured = &curve.measured;
    let pos = measured.partition_point(|&m| m < measured_m);
    if pos == 0 {
        return measured_m;
    }
    if pos == measured.len() || measured_m >= measured[measured.len() - 1] {
        return FAR_CEILING_M;
    }
    let (prev_meas, next_meas) = (measured[pos - 1], measured[pos]);
    let (prev_true, next_true) = (curve.truth[pos - 1], curve.truth[pos]);
    let alpha = (measured_m - prev_meas) / (next_meas - prev_meas);
    prev_true + alpha * (next_true - prev_true)
}

/// Shared correction delta for bulk depth samples.
///
/// The delta between a region's raw and corrected mean is computed once and
/// subtracted from every raw sample of that region. Pixels far from the mean
/// therefore get the mean's correction, not their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionOffset {
    diff: f64,
}

impl CorrectionOffset {
    /// Derive the offset from a region's uncorrected mean.
    pub fn from_mean(uncorrected_m: f64, curve: &CalibrationCurve) -> Self {
        let corrected = curve.correct(uncorrected_m);
        Self {
            diff: uncorrected_m - corrected,
        }
    }

    pub fn diff(&self) -> f64 {
        self.diff
    }

    /// Approximate the corrected value of a raw sample.
    pub fn apply(&self, raw_m: f64) -> f64 {
        raw_m - self.diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_curve() -> CalibrationCurve {
        CalibrationCurve::new(vec![0.5, 0.6, 0.7], vec![0.5, 0.6, 0.7]).unwrap()
    }

    #[test]
    fn test_below_range_passes_through() {
        assert_eq!(correct_distance(0.4, &identity_curve()), 0.4);
        assert_eq!(correct_distance(0.0, &identity_curve()), 0.0);
    }

    #[test]
    fn test_first_sample_passes_through() {
        assert_eq!(correct_distance(0.5, &identity_curve()), 0.5);
    }

    #[test]
    fn test_above_range_clamps_to_ceiling() {
        assert_eq!(correct_distance(0.8, &identity_curve()), FAR_CEILING_M);
    }

    #[test]
    fn test_midpoint_interpolation() {
        assert!((correct_distance(0.55, &identity_curve()) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_last_sample_clamps_to_ceiling() {
        assert_eq!(correct_distance(0.7, &identity_curve()), FAR_CEILING_M);
        assert!((correct_distance(0.699, &identity_curve()) - 0.699).abs() < 1e-12);
    }

    #[test]
    fn test_indoor_bad_hand_computed() {
        let curve = LightingCondition::IndoorBad.curve();
        // brackets 0.90 -> 0.9 and 1.01 -> 1.0
        let expected = 0.9 + (1.00 - 0.90) / (1.01 - 0.90) * (1.0 - 0.9);
        assert!((curve.correct(1.00) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_over_builtin_curves() {
        for condition in LightingCondition::ALL {
            let curve = condition.curve();
            let mut last = f64::MIN;
            let mut m = 0.0;
            while m < 11.5 {
                let c = curve.correct(m);
                // the near-field pass-through ends exactly where the table starts
                assert!(c >= last - 1e-9, "{condition} not monotonic at {m}");
                last = c;
                m += 0.01;
            }
        }
    }

    #[test]
    fn test_duplicate_measured_samples_are_safe() {
        let curve = CalibrationCurve::new(vec![1.0, 2.0, 2.0, 3.0], vec![1.0, 2.0, 2.5, 3.0]).unwrap();
        assert!((curve.correct(2.0) - 2.0).abs() < 1e-12);
        assert!(curve.correct(2.5).is_finite());
    }

    #[test]
    fn test_rejects_invalid_curves() {
        assert_eq!(
            CalibrationCurve::new(vec![], vec![]),
            Err(CalibrationError::Empty)
        );
        assert!(matches!(
            CalibrationCurve::new(vec![1.0, 2.0], vec![1.0]),
            Err(CalibrationError::LengthMismatch { .. })
        ));
        assert!(matches!(
            CalibrationCurve::new(vec![2.0, 1.0], vec![1.0, 2.0]),
            Err(CalibrationError::NotAscending { column: "measured", index: 1 })
        ));
    }

    #[test]
    fn test_lighting_parse() {
        assert_eq!(
            "Draußen - Gutes Licht".parse::<LightingCondition>().unwrap(),
            LightingCondition::OutdoorGood
        );
        assert_eq!(
            "INDOOR-GOOD".parse::<LightingCondition>().unwrap(),
            LightingCondition::IndoorGood
        );
        assert!("Auswählen".parse::<LightingCondition>().is_err());
        assert_eq!(
            LightingCondition::from_label_or_default(Some("Auswählen")),
            LightingCondition::IndoorBad
        );
        assert_eq!(
            LightingCondition::from_label_or_default(None),
            LightingCondition::IndoorBad
        );
    }

    #[test]
    fn test_correction_offset() {
        let curve = LightingCondition::IndoorBad.curve();
        let offset = CorrectionOffset::from_mean(1.00, &curve);
        assert!((offset.apply(1.00) - curve.correct(1.00)).abs() < 1e-12);
        assert!((offset.apply(1.20) - (1.20 - offset.diff())).abs() < 1e-12);
    }
}

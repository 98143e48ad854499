//! Depth-camera distance calibration and correction.

mod curve;

pub use curve::{
    correct_distance, CalibrationCurve, CalibrationError, CorrectionOffset, LightingCondition,
    FAR_CEILING_M,
};

//! Tunables for the focus control loop.

use crate::fusion::ProfileLayout;
use crate::selection::MIN_ROI_SIZE;

/// Configuration for [`FocusController`](super::FocusController).
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Added to every corrected distance for the lens/sensor geometry (m).
    pub camera_offset_m: f64,
    /// Minimum change in focus distance before a new move is issued (m).
    pub hysteresis_m: f64,
    /// Move duration until focus has locked once (s).
    pub ramp_time_s: f64,
    /// Move duration after the first lock (s).
    pub fast_time_s: f64,
    /// ROI corner grab tolerance (px).
    pub corner_size: i32,
    pub min_roi_size: i32,
    /// Share of mask pixels sampled for the locked person.
    pub tracked_sample_ratio: f64,
    /// Share of mask pixels sampled for everyone else.
    pub untracked_sample_ratio: f64,
    pub face_score_threshold: f32,
    /// Half edge of the depth window around each flow point (px).
    pub flow_window_half: u32,
    pub profile: ProfileLayout,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            camera_offset_m: 0.075,
            hysteresis_m: 0.02,
            ramp_time_s: 0.0,
            fast_time_s: 0.001,
            corner_size: 20,
            min_roi_size: MIN_ROI_SIZE,
            tracked_sample_ratio: 0.01,
            untracked_sample_ratio: 0.001,
            face_score_threshold: 0.3,
            flow_window_half: 5,
            profile: ProfileLayout::default(),
        }
    }
}

impl ControlConfig {
    /// Set the camera offset.
    pub fn with_camera_offset(mut self, meters: f64) -> Self {
        self.camera_offset_m = meters;
        self
    }

    /// Set the hysteresis threshold.
    pub fn with_hysteresis(mut self, meters: f64) -> Self {
        self.hysteresis_m = meters;
        self
    }

    /// Set the ramp focus time.
    pub fn with_ramp_time(mut self, seconds: f64) -> Self {
        self.ramp_time_s = seconds.max(0.0);
        self
    }

    /// Set the fast focus time.
    pub fn with_fast_time(mut self, seconds: f64) -> Self {
        self.fast_time_s = seconds.max(0.0);
        self
    }

    /// Set the corner grab tolerance.
    pub fn with_corner_size(mut self, px: i32) -> Self {
        self.corner_size = px;
        self
    }

    /// Set the mask sampling ratios.
    pub fn with_sample_ratios(mut self, tracked: f64, untracked: f64) -> Self {
        self.tracked_sample_ratio = tracked;
        self.untracked_sample_ratio = untracked;
        self
    }

    /// Set the profile canvas layout.
    pub fn with_profile(mut self, profile: ProfileLayout) -> Self {
        self.profile = profile;
        self
    }
}

//! Optical-flow fallback for a manually picked point inside the ROI.

use image::GrayImage;

use crate::vision::Point;

use super::lk::{calc_optical_flow_pyr_lk, LkParams};

/// Outcome of one [`FlowTracker::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlowUpdate {
    /// No point selected.
    Inactive,
    /// Surviving points in ROI-crop coordinates.
    Tracking(Vec<[f32; 2]>),
    /// Every point failed; the tracker has dropped its state.
    Lost,
}

/// Carries the previous ROI crop and point set from tick to tick.
#[derive(Debug, Clone, Default)]
pub struct FlowTracker {
    params: LkParams,
    prev: Option<GrayImage>,
    points: Vec<[f32; 2]>,
}

impl FlowTracker {
    pub fn new(params: LkParams) -> Self {
        Self {
            params,
            prev: None,
            points: Vec::new(),
        }
    }

    /// Start following `p` (ROI-crop coordinates). The next update seeds the
    /// previous crop.
    pub fn select(&mut self, p: Point) {
        self.points = vec![[p.x as f32, p.y as f32]];
        self.prev = None;
    }

    /// Forget the previous crop and points.
    pub fn invalidate(&mut self) {
        self.prev = None;
        self.points.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    /// Propagate the points into `crop`.
    ///
    /// The previous crop is replaced by `crop` whenever at least one point
    /// survives. A crop whose size differs from the stored one (the ROI was
    /// re-clamped) reseeds instead of tracking across sizes.
    pub fn update(&mut self, crop: &GrayImage) -> FlowUpdate {
        if self.points.is_empty() {
            return FlowUpdate::Inactive;
        }

        let prev = match self.prev.take() {
            Some(prev) if prev.dimensions() == crop.dimensions() => prev,
            _ => crop.clone(),
        };

        let result = calc_optical_flow_pyr_lk(&prev, crop, &self.points, &self.params);
        self.prev = Some(crop.clone());

        let survivors = result.survivors();
        if survivors.is_empty() {
            tracing::info!("Optical flow lost all points");
            self.invalidate();
            return FlowUpdate::Lost;
        }
        if survivors.len() < self.points.len() {
            tracing::debug!(
                "Optical flow kept {}/{} points",
                survivors.len(),
                self.points.len()
            );
        }
        self.points = survivors;
        FlowUpdate::Tracking(self.points.clone())
    }
}

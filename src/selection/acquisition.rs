//! Operator interaction: dragging the ROI and picking what to focus on.

use crate::vision::{Point, Track, TrackId};

use super::roi::{Corner, Roi};

/// What the operator wants in focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSelection {
    #[default]
    None,
    /// A tracked person.
    LockedTrack(TrackId),
    /// A point followed by optical flow, relative to the ROI origin.
    FlowPoint(Point),
}

/// Pointer interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging(Corner),
}

/// Result of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    CornerGrabbed(Corner),
    TrackLocked(TrackId),
    FlowPointSet(Point),
    /// Pressed outside everything; the selection was dropped.
    Cleared,
    /// No ROI yet, nothing to interact with.
    Ignored,
}

/// Result of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseOutcome {
    /// A corner drag ended; flow correspondences are stale.
    pub dragged: bool,
    /// The flow-point selection was dropped because of the drag.
    pub selection_cleared: bool,
}

/// ROI geometry plus the operator's current target.
#[derive(Debug, Clone)]
pub struct TargetAcquisition {
    roi: Option<Roi>,
    frame_size: (u32, u32),
    interaction: Interaction,
    selection: TargetSelection,
    corner_size: i32,
    min_roi_size: i32,
}

impl TargetAcquisition {
    pub fn new(corner_size: i32, min_roi_size: i32) -> Self {
        Self {
            roi: None,
            frame_size: (0, 0),
            interaction: Interaction::Idle,
            selection: TargetSelection::None,
            corner_size,
            min_roi_size,
        }
    }

    /// Adopt the size of the current frame. The first frame places the default
    /// ROI; later frames re-clamp the existing one.
    pub fn on_frame(&mut self, width: u32, height: u32) -> Roi {
        self.frame_size = (width, height);
        let min_size = self.min_roi_size;
        let roi = self
            .roi
            .get_or_insert_with(|| Roi::default_for_frame(width, height));
        roi.clamp(width, height, min_size);
        *roi
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi
    }

    pub fn selection(&self) -> TargetSelection {
        self.selection
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.interaction, Interaction::Dragging(_))
    }

    /// Handle a press at frame coordinates `p`.
    ///
    /// Corners win over tracks, tracks over the ROI interior. When several
    /// track boxes contain `p` the smallest one is chosen.
    pub fn press(&mut self, p: Point, tracks: &[Track]) -> PressOutcome {
        let Some(roi) = self.roi else {
            return PressOutcome::Ignored;
        };

        for corner in Corner::ALL {
            let c = roi.corner(corner);
            if (p.x - c.x).abs() < self.corner_size && (p.y - c.y).abs() < self.corner_size {
                self.interaction = Interaction::Dragging(corner);
                return PressOutcome::CornerGrabbed(corner);
            }
        }

        let hit = tracks
            .iter()
            .filter(|t| t.bbox.contains(p))
            .min_by(|a, b| a.bbox.area().total_cmp(&b.bbox.area()));
        if let Some(track) = hit {
            self.selection = TargetSelection::LockedTrack(track.id);
            tracing::info!("Locked focus on track {}", track.id);
            return PressOutcome::TrackLocked(track.id);
        }

        if roi.contains(p) {
            let local = p - roi.start;
            self.selection = TargetSelection::FlowPoint(local);
            tracing::info!("Flow point selected at ({}, {})", local.x, local.y);
            return PressOutcome::FlowPointSet(local);
        }

        self.selection = TargetSelection::None;
        PressOutcome::Cleared
    }

    /// Drag the grabbed corner to `p`. Returns `false` when not dragging.
    pub fn move_to(&mut self, p: Point) -> bool {
        let Interaction::Dragging(corner) = self.interaction else {
            return false;
        };
        let Some(roi) = self.roi.as_mut() else {
            return false;
        };
        roi.set_corner(corner, p);
        roi.clamp(self.frame_size.0, self.frame_size.1, self.min_roi_size);
        true
    }

    pub fn release(&mut self) -> ReleaseOutcome {
        let dragged = self.is_dragging();
        self.interaction = Interaction::Idle;
        let mut outcome = ReleaseOutcome {
            dragged,
            selection_cleared: false,
        };
        if dragged && matches!(self.selection, TargetSelection::FlowPoint(_)) {
            self.selection = TargetSelection::None;
            outcome.selection_cleared = true;
        }
        outcome
    }

    /// Drop the selection, e.g. after the flow tracker lost its points.
    pub fn clear_selection(&mut self) {
        self.selection = TargetSelection::None;
    }

    /// Forget the selection and any drag in progress. The ROI is kept.
    pub fn reset(&mut self) {
        self.selection = TargetSelection::None;
        self.interaction = Interaction::Idle;
    }
}

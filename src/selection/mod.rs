//! Region of interest and target selection.

mod acquisition;
mod roi;

pub use acquisition::{
    Interaction, PressOutcome, ReleaseOutcome, TargetAcquisition, TargetSelection,
};
pub use roi::{Corner, Roi, MIN_ROI_SIZE};

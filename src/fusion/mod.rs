//! Depth fusion: turns the selected target into a focus distance and
//! collects the depth-profile view.

mod crop;
mod depth;
mod profile;

pub use crop::{crop_bbox, occlusion_crop, PersonCrop};
pub use depth::{flow_depth_median, mean_depth_in, median, sample_mask, MaskSample};
pub use profile::{DepthProfile, MarkerKind, ProfileLayout, ProfileMarker};

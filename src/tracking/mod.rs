//! Optical-flow point tracking.

mod flow;
mod lk;

pub use flow::{FlowTracker, FlowUpdate};
pub use lk::{calc_optical_flow_pyr_lk, LkParams, LkResult};

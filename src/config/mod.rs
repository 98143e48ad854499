//! Static configuration for the focus puller: calibration tables, operator
//! messages and the rig setup checklist.

mod i18n;
mod setup;
pub mod tables;

pub use i18n::{get_messages, is_affirmative, Messages, MESSAGES_DE, MESSAGES_EN};
pub use setup::{SetupChecklist, SetupError};
pub use tables::MOTOR_LUT_TABLE;

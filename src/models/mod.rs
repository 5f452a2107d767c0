pub mod care;
pub mod dialog_state;
pub mod plant;

pub use care::CareEntry;
pub use dialog_state::{parse_custom_interval, DialogState, IntervalError, INTERVAL_PRESETS};
pub use plant::{DuePlant, Plant};

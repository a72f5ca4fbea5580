//! Forecast post-processing: holiday zeroing and monthly target conformance.
//!
//! Order matters: holidays are zeroed and redistributed first, then monthly
//! targets are applied, so client totals already reflect the holiday policy.

mod holiday;
mod target;

pub use holiday::{adjust_for_holidays, HolidayAdjustment};
pub use target::{apply_monthly_targets, conform_integral};

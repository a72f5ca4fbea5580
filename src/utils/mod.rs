//! Numeric utilities shared by the fitting and evaluation paths.

pub mod metrics;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, median, quantile, quantile_normal, winsorize_iqr};

//! Error types for the contact-forecast library.

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::MonthKey;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building series, fitting models, or applying
/// forecast adjustments.
///
/// All variants are per-channel and recoverable: a multi-channel training
/// batch maps each error onto that channel's job status instead of aborting
/// the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Too few distinct dates to extract a pattern or fit a model.
    #[error("insufficient history: need at least {needed} days, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// A daily series skipped one or more calendar days.
    #[error("date gap in series: expected {expected}, got {got}")]
    DateGap { expected: NaiveDate, got: NaiveDate },

    /// The same date appeared twice in one channel's observations.
    #[error("duplicate date in series: {0}")]
    DuplicateDate(NaiveDate),

    /// Every searched model configuration failed to converge.
    #[error("model fit failed: no candidate configuration converged")]
    FitNonConvergence,

    /// A monthly target cannot be applied because the base total is zero.
    #[error("non-distributable target for {month}: base forecast total is zero")]
    NonDistributableTarget { month: MonthKey },

    /// The holiday calendar does not recognize the country code.
    #[error("invalid country code: {0:?}")]
    InvalidCountryCode(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model was asked to forecast before being fitted.
    #[error("model must be fitted before forecasting")]
    FitRequired,
}

//! # contact-forecast
//!
//! Forecasts future daily contact volumes per channel (calls, emails, chats)
//! from historical daily observations, honoring two business overrides:
//! bank-holiday zeroing with volume redistribution onto nearby days, and
//! client-supplied monthly totals applied while preserving daily shape.
//!
//! The pipeline per channel: seasonal profile extraction, AIC-based search
//! over Holt-Winters configurations (with a flagged naive fallback), forecast
//! generation with interval bounds, holiday adjustment, monthly target
//! distribution, and a holdout backtest. Channels are independent and train
//! in parallel; retraining supersedes the previous model atomically through
//! the versioned store.

pub mod adjust;
pub mod backtest;
pub mod calendar;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod seasonality;
pub mod summary;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::adjust::{adjust_for_holidays, apply_monthly_targets, conform_integral};
    pub use crate::backtest::{backtest, BacktestConfig, BacktestReport};
    pub use crate::calendar::{CachedCalendar, FixedCalendar, HolidayCalendar};
    pub use crate::core::{DailySeries, ForecastSeries, MonthKey};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{ModelChoice, ModelConfig, SelectorConfig, TrainedModel};
    pub use crate::pipeline::{
        train_all, train_channel, ChannelJob, JobStatus, ModelStore, PipelineConfig,
    };
    pub use crate::seasonality::SeasonalProfile;
    pub use crate::summary::{
        monthly_forecast, monthly_history, summarize, ChannelSummary, MonthlyAggregate,
    };
}

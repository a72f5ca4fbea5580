//! Backtesting: hold out recent history and score the model against it.

use chrono::NaiveDate;

use crate::core::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::{fit_fallback, select_model, SelectorConfig, TrainedModel};
use crate::seasonality::SeasonalProfile;
use crate::utils::metrics::calculate_metrics;
use crate::utils::stats::winsorize_iqr;

/// Margin of training data required beyond the holdout window.
const MIN_TRAIN_MARGIN: usize = 14;

/// Floor applied to de-seasonalised training values so multiplicative
/// candidates stay defined.
pub(crate) const DESEASONALIZED_FLOOR: f64 = 0.1;

/// Configuration for a backtest run.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Days withheld from the end of the series.
    pub holdout_days: usize,
    /// Model search settings for the throwaway refit.
    pub selector: SelectorConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            holdout_days: 60,
            selector: SelectorConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn with_holdout_days(mut self, days: usize) -> Self {
        self.holdout_days = days;
        self
    }
}

/// One holdout day with its prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

/// Accuracy report for one channel's holdout window.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub channel: String,
    pub holdout_days: usize,
    /// MAPE in percent over non-zero actuals; `None` when every actual in
    /// the holdout was zero.
    pub mape: Option<f64>,
    pub mae: f64,
    pub rmse: f64,
    pub points: Vec<BacktestPoint>,
}

/// Withhold the trailing window, refit on the prefix, score on the window.
///
/// The refit is a throwaway scoped to this call; the channel's active model
/// is never touched. Repeated runs over the same inputs produce identical
/// metrics.
pub fn backtest(series: &DailySeries, config: &BacktestConfig) -> Result<BacktestReport> {
    let holdout = config.holdout_days;
    if holdout == 0 {
        return Err(ForecastError::InvalidParameter(
            "holdout length must be at least 1 day".to_string(),
        ));
    }
    let needed = holdout + MIN_TRAIN_MARGIN + 1;
    if series.len() < needed {
        return Err(ForecastError::InsufficientHistory {
            needed,
            got: series.len(),
        });
    }

    let (train, test) = series.split_at_tail(holdout)?;

    // Same preparation as live training, restricted to the prefix so no
    // holdout information leaks into the fit.
    let train = train.with_values(winsorize_iqr(train.values()))?;
    let profile = match SeasonalProfile::extract(&train) {
        Ok(profile) => profile,
        Err(ForecastError::InsufficientHistory { .. }) => SeasonalProfile::flat(),
        Err(err) => return Err(err),
    };
    let deseasonalized: Vec<f64> = profile
        .deseasonalize(&train)
        .into_iter()
        .map(|v| v.max(DESEASONALIZED_FLOOR))
        .collect();

    let selection = match select_model(&deseasonalized, &config.selector) {
        Ok(selection) => selection,
        Err(ForecastError::FitNonConvergence) => {
            fit_fallback(&deseasonalized, &config.selector)?
        }
        Err(err) => return Err(err),
    };

    let model = TrainedModel::new(series.channel(), selection, profile, train.end());
    let forecast = model.forecast(holdout, 0.95)?;
    debug_assert_eq!(forecast.start(), test.start());

    let points: Vec<BacktestPoint> = test
        .iter()
        .enumerate()
        .map(|(i, (date, actual))| BacktestPoint {
            date,
            actual,
            predicted: forecast.point()[i],
        })
        .collect();

    let actuals: Vec<f64> = points.iter().map(|p| p.actual).collect();
    let predicted: Vec<f64> = points.iter().map(|p| p.predicted).collect();
    let metrics = calculate_metrics(&actuals, &predicted)?;

    Ok(BacktestReport {
        channel: series.channel().to_string(),
        holdout_days: holdout,
        mape: metrics.mape,
        mae: metrics.mae,
        rmse: metrics.rmse,
        points,
    })
}

//! A channel's trained model and the forecast generator.

use chrono::{Days, NaiveDate};

use crate::core::ForecastSeries;
use crate::error::{ForecastError, Result};
use crate::models::config::ModelChoice;
use crate::models::selector::{FittedEngine, Selection};
use crate::seasonality::SeasonalProfile;
use crate::utils::stats::quantile_normal;

/// The active model of one channel.
///
/// Immutable once built: retraining produces a new `TrainedModel` that
/// supersedes this one in the store, so concurrent readers always see a
/// consistent model/forecast pair.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    channel: String,
    choice: ModelChoice,
    aic: Option<f64>,
    engine: FittedEngine,
    profile: SeasonalProfile,
    anchor: NaiveDate,
    version: u32,
}

impl TrainedModel {
    /// Wrap a selection together with the seasonal profile and the last
    /// training date.
    pub fn new(
        channel: impl Into<String>,
        selection: Selection,
        profile: SeasonalProfile,
        anchor: NaiveDate,
    ) -> Self {
        Self {
            channel: channel.into(),
            choice: selection.choice,
            aic: selection.aic,
            engine: selection.engine,
            profile,
            anchor,
            version: 0,
        }
    }

    pub(crate) fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The winning configuration, or the fallback marker.
    pub fn choice(&self) -> ModelChoice {
        self.choice
    }

    /// AIC of the selected configuration; `None` for the fallback baseline.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Seasonal profile extracted from the training history.
    pub fn profile(&self) -> &SeasonalProfile {
        &self.profile
    }

    /// Last date of the training history; forecasts start the day after.
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Version assigned when published to a model store.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Generate `horizon` days of forecast starting the day after the anchor.
    ///
    /// Point estimates come from the fitted components re-scaled by each
    /// target date's month factor; intervals widen with distance using the
    /// in-sample residual variance. Everything is floored at zero, since
    /// volumes cannot be negative.
    pub fn forecast(&self, horizon: usize, confidence: f64) -> Result<ForecastSeries> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1 day".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&confidence) || confidence <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence must be in (0, 1), got {confidence}"
            )));
        }

        let raw = self.engine.forecast(horizon)?;
        let variance = self.engine.residual_variance().max(0.0);
        let z = quantile_normal((1.0 + confidence) / 2.0);
        let period = self.engine.period().max(1);
        let seasonal = self.engine.has_seasonal();

        let start = self
            .anchor
            .checked_add_days(Days::new(1))
            .expect("date arithmetic overflow");

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        for (i, &value) in raw.iter().enumerate() {
            let date = start
                .checked_add_days(Days::new(i as u64))
                .expect("date arithmetic overflow");
            let factor = self.profile.month_factor_for(date);

            // Residual variance accumulates per step; seasonal models widen
            // per completed cycle instead of per day.
            let steps = if seasonal { i / period + 1 } else { i + 1 };
            let se = (variance * steps as f64).sqrt();

            point.push((value * factor).max(0.0));
            lower.push(((value - z * se) * factor).max(0.0));
            upper.push(((value + z * se) * factor).max(0.0));
        }

        ForecastSeries::new(start, point, lower, upper)
    }
}

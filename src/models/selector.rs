//! Model selection: fit every candidate configuration, keep the best AIC.

use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::baseline::SeasonalAverage;
use crate::models::config::{ModelChoice, ModelConfig};
use crate::models::smoothing::HoltWinters;

/// Configuration for the model search.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Seasonal cycle length; daily contact data has a weekly cycle.
    pub seasonal_period: usize,
    /// Minimum history length required before searching.
    pub min_history_days: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 7,
            min_history_days: 30,
        }
    }
}

impl SelectorConfig {
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period.max(1);
        self
    }

    pub fn with_min_history_days(mut self, days: usize) -> Self {
        self.min_history_days = days;
        self
    }
}

/// The engine behind a selected model: either a fitted smoothing model or
/// the naive baseline.
#[derive(Debug, Clone)]
pub enum FittedEngine {
    Smoothing(HoltWinters),
    Baseline(SeasonalAverage),
}

impl FittedEngine {
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        match self {
            FittedEngine::Smoothing(model) => model.forecast(horizon),
            FittedEngine::Baseline(model) => model.forecast(horizon),
        }
    }

    pub fn residual_variance(&self) -> f64 {
        match self {
            FittedEngine::Smoothing(model) => model.residual_variance().unwrap_or(0.0),
            FittedEngine::Baseline(model) => model.residual_variance().unwrap_or(0.0),
        }
    }

    /// Whether interval widening should follow seasonal cycles rather than
    /// raw steps ahead.
    pub fn has_seasonal(&self) -> bool {
        match self {
            FittedEngine::Smoothing(model) => model.config().has_seasonal(),
            FittedEngine::Baseline(_) => true,
        }
    }

    pub fn period(&self) -> usize {
        match self {
            FittedEngine::Smoothing(model) => model.period(),
            FittedEngine::Baseline(model) => model.period(),
        }
    }
}

/// Outcome of model selection for one channel.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Which configuration won, or the fallback marker.
    pub choice: ModelChoice,
    /// AIC of the winner; the fallback baseline has no information criterion.
    pub aic: Option<f64>,
    /// The fitted engine ready to forecast.
    pub engine: FittedEngine,
}

/// Search the configuration space and return the lowest-AIC fit.
///
/// Ties resolve toward fewer free parameters, then candidate order.
/// Multiplicative seasonality is excluded when any value is zero or
/// negative. Every candidate failing is [`ForecastError::FitNonConvergence`];
/// callers decide whether to fall back to [`fit_fallback`].
pub fn select_model(values: &[f64], config: &SelectorConfig) -> Result<Selection> {
    if values.len() < config.min_history_days {
        return Err(ForecastError::InsufficientHistory {
            needed: config.min_history_days,
            got: values.len(),
        });
    }

    let allow_multiplicative = values.iter().all(|&v| v > 0.0);
    let mut best: Option<(f64, usize, HoltWinters)> = None;

    for candidate in ModelConfig::candidates(allow_multiplicative) {
        let mut model = HoltWinters::new(candidate, config.seasonal_period);
        let aic = match model.fit(values) {
            Ok(()) => match model.aic() {
                Some(aic) if aic.is_finite() => aic,
                _ => continue,
            },
            Err(err) => {
                debug!(config = %candidate, %err, "candidate skipped");
                continue;
            }
        };
        debug!(config = %candidate, aic, "candidate fitted");

        let params = candidate.free_params();
        let improves = match &best {
            None => true,
            Some((best_aic, best_params, _)) => {
                aic < *best_aic || (aic == *best_aic && params < *best_params)
            }
        };
        if improves {
            best = Some((aic, params, model));
        }
    }

    match best {
        Some((aic, _, model)) => {
            debug!(config = %model.config(), aic, "selected model");
            Ok(Selection {
                choice: ModelChoice::Fitted(model.config()),
                aic: Some(aic),
                engine: FittedEngine::Smoothing(model),
            })
        }
        None => Err(ForecastError::FitNonConvergence),
    }
}

/// Fit the naive seasonal-average baseline, flagged as a fallback.
pub fn fit_fallback(values: &[f64], config: &SelectorConfig) -> Result<Selection> {
    let mut model = SeasonalAverage::new(config.seasonal_period);
    model.fit(values)?;
    Ok(Selection {
        choice: ModelChoice::Fallback,
        aic: None,
        engine: FittedEngine::Baseline(model),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SeasonalKind;

    fn weekday_pattern(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 7 < 5 { 1000.0 } else { 400.0 })
            .collect()
    }

    #[test]
    fn selects_seasonal_model_for_weekly_pattern() {
        let values = weekday_pattern(120);
        let selection = select_model(&values, &SelectorConfig::default()).unwrap();

        assert!(selection.aic.unwrap().is_finite());
        match selection.choice {
            ModelChoice::Fitted(config) => assert!(config.has_seasonal()),
            ModelChoice::Fallback => panic!("expected a fitted model"),
        }
    }

    #[test]
    fn skips_multiplicative_when_zeros_present() {
        let mut values = weekday_pattern(120);
        values[10] = 0.0;
        let selection = select_model(&values, &SelectorConfig::default()).unwrap();

        if let ModelChoice::Fitted(config) = selection.choice {
            assert_ne!(config.seasonal, SeasonalKind::Multiplicative);
        }
    }

    #[test]
    fn too_little_history_is_rejected() {
        let values = weekday_pattern(20);
        assert!(matches!(
            select_model(&values, &SelectorConfig::default()),
            Err(ForecastError::InsufficientHistory { needed: 30, got: 20 })
        ));
    }

    #[test]
    fn selection_is_deterministic() {
        let values = weekday_pattern(90);
        let config = SelectorConfig::default();
        let first = select_model(&values, &config).unwrap();
        let second = select_model(&values, &config).unwrap();

        assert_eq!(first.choice, second.choice);
        assert_eq!(first.aic, second.aic);
    }

    #[test]
    fn fallback_is_flagged() {
        let values = weekday_pattern(60);
        let selection = fit_fallback(&values, &SelectorConfig::default()).unwrap();

        assert!(selection.choice.is_fallback());
        assert!(selection.aic.is_none());
        let forecast = selection.engine.forecast(7).unwrap();
        assert_eq!(forecast.len(), 7);
    }

    #[test]
    fn selected_engine_forecasts_requested_horizon() {
        let values = weekday_pattern(90);
        let selection = select_model(&values, &SelectorConfig::default()).unwrap();
        let forecast = selection.engine.forecast(30).unwrap();
        assert_eq!(forecast.len(), 30);
    }
}

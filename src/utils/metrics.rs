//! Accuracy metrics for backtest evaluation.

use crate::error::{ForecastError, Result};

/// Forecast accuracy metrics.
///
/// MAPE is computed only over dates where the actual is non-zero; a holdout
/// with no non-zero actuals has no defined MAPE. MAE and RMSE always cover
/// every date.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Percentage Error, in percent.
    pub mape: Option<f64>,
    /// Mean Absolute Error.
    pub mae: f64,
    /// Root Mean Squared Error.
    pub rmse: f64,
}

/// Compute accuracy metrics between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "actual and predicted lengths differ: {} vs {}",
            actual.len(),
            predicted.len()
        )));
    }

    let n = actual.len() as f64;

    let mae = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let rmse = (actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let mut pct_sum = 0.0;
    let mut pct_count = 0usize;
    for (a, p) in actual.iter().zip(predicted) {
        if *a != 0.0 {
            pct_sum += ((a - p) / a).abs();
            pct_count += 1;
        }
    }
    let mape = (pct_count > 0).then(|| 100.0 * pct_sum / pct_count as f64);

    Ok(AccuracyMetrics { mape, mae, rmse })
}

//! Naive seasonal-average baseline, the fallback when no smoothing
//! configuration converges.

use crate::error::{ForecastError, Result};
use crate::utils::stats::mean;

/// Forecasts each future day as the historical mean of its position in the
/// seasonal cycle.
#[derive(Debug, Clone)]
pub struct SeasonalAverage {
    period: usize,
    means: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    n: usize,
}

impl SeasonalAverage {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            means: None,
            residual_variance: None,
            n: 0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    pub fn is_fitted(&self) -> bool {
        self.means.is_some()
    }

    /// Compute the per-position means over the full history.
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < self.period {
            return Err(ForecastError::InsufficientHistory {
                needed: self.period,
                got: values.len(),
            });
        }

        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); self.period];
        for (t, &v) in values.iter().enumerate() {
            buckets[t % self.period].push(v);
        }
        let means: Vec<f64> = buckets.iter().map(|b| mean(b)).collect();

        let sse: f64 = values
            .iter()
            .enumerate()
            .map(|(t, &v)| {
                let r = v - means[t % self.period];
                r * r
            })
            .sum();
        self.residual_variance = Some(sse / values.len() as f64);
        self.means = Some(means);
        self.n = values.len();
        Ok(())
    }

    /// Repeat the seasonal means forward, continuing the cycle phase.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let means = self.means.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok((1..=horizon)
            .map(|h| means[(self.n + h - 1) % self.period])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn repeats_cycle_means() {
        // Two full weeks of a clean weekly pattern starting at phase 0.
        let week = [10.0, 20.0, 30.0, 40.0, 50.0, 5.0, 5.0];
        let values: Vec<f64> = week.iter().chain(week.iter()).copied().collect();

        let mut model = SeasonalAverage::new(7);
        model.fit(&values).unwrap();

        let forecast = model.forecast(7).unwrap();
        // 14 observations fitted, so the forecast resumes at phase 0.
        for (i, &expected) in week.iter().enumerate() {
            assert_relative_eq!(forecast[i], expected, epsilon = 1e-12);
        }
        assert_relative_eq!(model.residual_variance().unwrap(), 0.0);
    }

    #[test]
    fn continues_phase_mid_cycle() {
        // 10 observations of an alternating pattern, period 2.
        let values = [1.0, 9.0, 1.0, 9.0, 1.0, 9.0, 1.0, 9.0, 1.0, 9.0];
        let mut model = SeasonalAverage::new(2);
        model.fit(&values).unwrap();

        // Next index is 10 (even), so the forecast starts on the 1.0 phase.
        let forecast = model.forecast(4).unwrap();
        assert_relative_eq!(forecast[0], 1.0);
        assert_relative_eq!(forecast[1], 9.0);
        assert_relative_eq!(forecast[2], 1.0);
    }

    #[test]
    fn requires_one_full_cycle() {
        let mut model = SeasonalAverage::new(7);
        assert!(matches!(
            model.fit(&[1.0, 2.0, 3.0]),
            Err(ForecastError::InsufficientHistory { needed: 7, got: 3 })
        ));
    }

    #[test]
    fn forecast_requires_fit() {
        let model = SeasonalAverage::new(7);
        assert!(matches!(
            model.forecast(3),
            Err(ForecastError::FitRequired)
        ));
    }
}

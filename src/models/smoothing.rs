//! Holt-Winters exponential smoothing driven by a tagged configuration.
//!
//! One fitting routine covers the whole search space: the trend/seasonal/
//! damped tags select the recursion arms, and smoothing parameters are
//! estimated by Nelder-Mead minimization of the one-step-ahead Gaussian
//! negative log-likelihood.

use crate::error::{ForecastError, Result};
use crate::models::config::{ModelConfig, SeasonalKind};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

const PARAM_EPS: f64 = 1e-4;
const VARIANCE_FLOOR: f64 = 1e-10;

/// State and diagnostics after one pass of the smoothing recursion.
struct Recursion {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    sse: f64,
    count: usize,
}

/// Holt-Winters model for daily contact volumes.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    config: ModelConfig,
    period: usize,
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    phi: Option<f64>,
    level: Option<f64>,
    trend_state: f64,
    seasonals: Vec<f64>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    n: usize,
}

impl HoltWinters {
    /// Create an unfitted model for `config` with the given seasonal period.
    pub fn new(config: ModelConfig, period: usize) -> Self {
        Self {
            config,
            period: period.max(1),
            alpha: None,
            beta: None,
            gamma: None,
            phi: None,
            level: None,
            trend_state: 0.0,
            seasonals: Vec::new(),
            residual_variance: None,
            aic: None,
            n: 0,
        }
    }

    pub fn config(&self) -> ModelConfig {
        self.config
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    pub fn phi(&self) -> Option<f64> {
        self.phi
    }

    /// Akaike Information Criterion of the fitted model.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// One-step residual variance of the fitted model.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    pub fn is_fitted(&self) -> bool {
        self.level.is_some()
    }

    /// Fit the model to `values` (one observation per day).
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        let min_len = if self.config.has_seasonal() {
            2 * self.period
        } else {
            2
        };
        if values.len() < min_len {
            return Err(ForecastError::InsufficientHistory {
                needed: min_len,
                got: values.len(),
            });
        }
        if self.config.seasonal == SeasonalKind::Multiplicative
            && values.iter().any(|&v| v <= 0.0)
        {
            return Err(ForecastError::InvalidParameter(
                "multiplicative seasonality requires strictly positive values".to_string(),
            ));
        }

        self.n = values.len();

        let (initial, bounds) = self.parameter_space();
        let result = nelder_mead(
            |p| self.objective(values, p),
            &initial,
            Some(&bounds),
            NelderMeadConfig::default(),
        );
        let (alpha, beta, gamma, phi) = self.unpack(&result.optimal_point);

        let recursion = self
            .run(values, alpha, beta, gamma, phi)
            .ok_or(ForecastError::FitNonConvergence)?;
        if recursion.count == 0 || !recursion.sse.is_finite() {
            return Err(ForecastError::FitNonConvergence);
        }

        let variance = (recursion.sse / recursion.count as f64).max(VARIANCE_FLOOR);
        let n = recursion.count as f64;
        let k = self.num_params() as f64;
        let ll = -0.5 * n * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());

        self.alpha = Some(alpha);
        self.beta = self.config.has_trend().then_some(beta);
        self.gamma = self.config.has_seasonal().then_some(gamma);
        self.phi = self.config.is_damped().then_some(phi);
        self.level = Some(recursion.level);
        self.trend_state = recursion.trend;
        self.seasonals = recursion.seasonals;
        self.residual_variance = Some(variance);
        self.aic = Some(-2.0 * ll + 2.0 * k);

        Ok(())
    }

    /// Project the fitted components `horizon` steps ahead.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend_state;
        let phi = self.phi.unwrap_or(1.0);

        let out = (1..=horizon)
            .map(|h| {
                let trend_component = if self.config.has_trend() {
                    if self.config.is_damped() {
                        damped_sum(phi, h) * trend
                    } else {
                        h as f64 * trend
                    }
                } else {
                    0.0
                };
                let base = level + trend_component;
                match self.config.seasonal {
                    SeasonalKind::None => base,
                    SeasonalKind::Additive => {
                        base + self.seasonals[(self.n + h - 1) % self.period]
                    }
                    SeasonalKind::Multiplicative => {
                        base * self.seasonals[(self.n + h - 1) % self.period]
                    }
                }
            })
            .collect();
        Ok(out)
    }

    /// Total parameter count for the information criterion: free smoothing
    /// parameters plus estimated initial states.
    fn num_params(&self) -> usize {
        let mut count = self.config.free_params();
        count += 1; // initial level
        if self.config.has_trend() {
            count += 1;
        }
        if self.config.has_seasonal() {
            count += self.period;
        }
        count
    }

    /// Initial guesses and bounds for the free parameters, in unpack order.
    fn parameter_space(&self) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut initial = vec![0.3];
        let mut bounds = vec![(PARAM_EPS, 1.0 - PARAM_EPS)];
        if self.config.has_trend() {
            initial.push(0.1);
            bounds.push((PARAM_EPS, 1.0 - PARAM_EPS));
        }
        if self.config.has_seasonal() {
            initial.push(0.1);
            bounds.push((PARAM_EPS, 1.0 - PARAM_EPS));
        }
        if self.config.is_damped() {
            initial.push(0.95);
            bounds.push((0.8, 0.98));
        }
        (initial, bounds)
    }

    /// Map an optimizer point back to (alpha, beta, gamma, phi).
    fn unpack(&self, p: &[f64]) -> (f64, f64, f64, f64) {
        let mut it = p.iter().copied();
        let alpha = it.next().unwrap_or(0.3).clamp(PARAM_EPS, 1.0 - PARAM_EPS);
        let beta = if self.config.has_trend() {
            it.next().unwrap_or(0.1).clamp(PARAM_EPS, 1.0 - PARAM_EPS)
        } else {
            0.0
        };
        let gamma = if self.config.has_seasonal() {
            it.next().unwrap_or(0.1).clamp(PARAM_EPS, 1.0 - PARAM_EPS)
        } else {
            0.0
        };
        let phi = if self.config.is_damped() {
            it.next().unwrap_or(0.95).clamp(0.8, 0.98)
        } else {
            1.0
        };
        (alpha, beta, gamma, phi)
    }

    /// Negative log-likelihood of the one-step residuals for the optimizer.
    fn objective(&self, values: &[f64], p: &[f64]) -> f64 {
        let (alpha, beta, gamma, phi) = self.unpack(p);
        match self.run(values, alpha, beta, gamma, phi) {
            Some(r) if r.count > 0 && r.sse.is_finite() => {
                let sigma2 = (r.sse / r.count as f64).max(VARIANCE_FLOOR);
                0.5 * r.count as f64
                    * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln())
            }
            _ => f64::MAX,
        }
    }

    /// One pass of the smoothing recursion over the history.
    fn run(&self, values: &[f64], alpha: f64, beta: f64, gamma: f64, phi: f64) -> Option<Recursion> {
        let period = self.period;
        let seasonal = self.config.has_seasonal();
        let has_trend = self.config.has_trend();
        let start = if seasonal { period } else { 1 };
        if values.len() <= start {
            return None;
        }

        let (mut level, mut trend, mut seasonals) = self.initial_state(values);
        let mut sse = 0.0;
        let mut count = 0usize;

        for (t, &y) in values.iter().enumerate().skip(start) {
            let s_idx = if seasonal { t % period } else { 0 };
            let s = if seasonal { seasonals[s_idx] } else { 0.0 };
            let base = if has_trend { level + phi * trend } else { level };

            let one_step = match self.config.seasonal {
                SeasonalKind::None => base,
                SeasonalKind::Additive => base + s,
                SeasonalKind::Multiplicative => base * s,
            };

            let e = y - one_step;
            sse += e * e;
            count += 1;

            let deseasoned = match self.config.seasonal {
                SeasonalKind::None => y,
                SeasonalKind::Additive => y - s,
                SeasonalKind::Multiplicative => {
                    if s.abs() > 1e-10 {
                        y / s
                    } else {
                        y
                    }
                }
            };

            let new_level = alpha * deseasoned + (1.0 - alpha) * base;
            if has_trend {
                trend = beta * (new_level - level) + (1.0 - beta) * phi * trend;
            }
            if seasonal {
                seasonals[s_idx] = match self.config.seasonal {
                    SeasonalKind::Additive => gamma * (y - new_level) + (1.0 - gamma) * s,
                    SeasonalKind::Multiplicative => {
                        if new_level.abs() > 1e-10 {
                            gamma * (y / new_level) + (1.0 - gamma) * s
                        } else {
                            s
                        }
                    }
                    SeasonalKind::None => s,
                };
            }
            level = new_level;
        }

        if !level.is_finite() || !trend.is_finite() || seasonals.iter().any(|s| !s.is_finite()) {
            return None;
        }

        Some(Recursion {
            level,
            trend,
            seasonals,
            sse,
            count,
        })
    }

    /// Warm-up estimates for level, trend and the seasonal indices.
    fn initial_state(&self, values: &[f64]) -> (f64, f64, Vec<f64>) {
        let period = self.period;
        let seasonal = self.config.has_seasonal();

        let level = if seasonal && values.len() >= period {
            values.iter().take(period).sum::<f64>() / period as f64
        } else {
            values[0]
        };

        let trend = if self.config.has_trend() && values.len() >= 2 {
            if seasonal && values.len() >= 2 * period {
                let sum: f64 = (0..period)
                    .map(|i| (values[period + i] - values[i]) / period as f64)
                    .sum();
                sum / period as f64
            } else {
                values[1] - values[0]
            }
        } else {
            0.0
        };

        let seasonals = if seasonal && values.len() >= period {
            match self.config.seasonal {
                SeasonalKind::Additive => values.iter().take(period).map(|y| y - level).collect(),
                SeasonalKind::Multiplicative => values
                    .iter()
                    .take(period)
                    .map(|y| if level.abs() > 1e-10 { y / level } else { 1.0 })
                    .collect(),
                SeasonalKind::None => vec![],
            }
        } else {
            vec![]
        };

        (level, trend, seasonals)
    }
}

/// Sum of `phi + phi^2 + ... + phi^h`, the damped trend multiplier.
fn damped_sum(phi: f64, h: usize) -> f64 {
    if (phi - 1.0).abs() < 1e-10 {
        h as f64
    } else {
        phi * (1.0 - phi.powi(h as i32)) / (1.0 - phi)
    }
}

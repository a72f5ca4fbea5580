//! Per-channel training pipeline, parallel fan-out and the versioned store.
//!
//! Within one channel the steps are strictly sequential: winsorise →
//! seasonal profile → model selection → forecast → holiday adjustment →
//! monthly targets → backtest. Across channels the jobs are independent and
//! run on the rayon pool; one channel failing never aborts the batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::adjust::{adjust_for_holidays, apply_monthly_targets};
use crate::backtest::{backtest, BacktestConfig, BacktestReport, DESEASONALIZED_FLOOR};
use crate::calendar::HolidayCalendar;
use crate::core::{DailySeries, ForecastSeries, MonthKey};
use crate::error::{ForecastError, Result};
use crate::models::{fit_fallback, select_model, SelectorConfig, TrainedModel};
use crate::seasonality::SeasonalProfile;
use crate::utils::stats::winsorize_iqr;

/// Settings for a training run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Forecast length in days (about 15 months by default).
    pub horizon_days: usize,
    /// Confidence level for interval bounds.
    pub confidence: f64,
    /// Model search settings.
    pub selector: SelectorConfig,
    /// Backtest holdout length in days.
    pub holdout_days: usize,
    /// Whether to run the backtest as part of training.
    pub run_backtest: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_days: 450,
            confidence: 0.95,
            selector: SelectorConfig::default(),
            holdout_days: 60,
            run_backtest: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_horizon_days(mut self, days: usize) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_holdout_days(mut self, days: usize) -> Self {
        self.holdout_days = days;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn without_backtest(mut self) -> Self {
        self.run_backtest = false;
        self
    }
}

/// One channel's training input.
#[derive(Debug, Clone)]
pub struct ChannelJob {
    pub series: DailySeries,
    /// Country code enabling holiday adjustment; absent means holidays are
    /// ignored for this channel.
    pub holiday_country: Option<String>,
    /// Client monthly volume targets, possibly sparse.
    pub targets: BTreeMap<MonthKey, f64>,
}

impl ChannelJob {
    pub fn new(series: DailySeries) -> Self {
        Self {
            series,
            holiday_country: None,
            targets: BTreeMap::new(),
        }
    }

    pub fn with_holiday_country(mut self, country: impl Into<String>) -> Self {
        self.holiday_country = Some(country.into());
        self
    }

    pub fn with_target(mut self, month: MonthKey, volume: f64) -> Self {
        self.targets.insert(month, volume);
        self
    }

    pub fn channel(&self) -> &str {
        self.series.channel()
    }
}

/// Terminal state of one channel's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    /// Training finished but on the naive fallback baseline.
    CompletedWithFallback,
    Failed(String),
}

impl JobStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }
}

/// Everything produced for one channel by a successful training run.
#[derive(Debug, Clone)]
pub struct ChannelArtifacts {
    pub model: TrainedModel,
    /// Forecast after holiday adjustment and target distribution.
    pub forecast: ForecastSeries,
    /// Holdout accuracy, when history allowed a backtest.
    pub backtest: Option<BacktestReport>,
}

/// Result of one channel's job, successful or not.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub channel: String,
    pub status: JobStatus,
    /// Echo of the job configuration, for presentation collaborators.
    pub holiday_country: Option<String>,
    pub targets: BTreeMap<MonthKey, f64>,
    pub artifacts: Option<ChannelArtifacts>,
}

/// Run the full pipeline for a single channel.
pub fn train_channel<C>(job: &ChannelJob, calendar: &C, config: &PipelineConfig) -> ChannelOutcome
where
    C: HolidayCalendar + ?Sized,
{
    let channel = job.channel().to_string();
    match run_pipeline(job, calendar, config) {
        Ok((artifacts, used_fallback)) => {
            let status = if used_fallback {
                warn!(channel = %channel, "trained on fallback baseline");
                JobStatus::CompletedWithFallback
            } else {
                info!(channel = %channel, model = %artifacts.model.choice(), "training completed");
                JobStatus::Completed
            };
            ChannelOutcome {
                channel,
                status,
                holiday_country: job.holiday_country.clone(),
                targets: job.targets.clone(),
                artifacts: Some(artifacts),
            }
        }
        Err(err) => {
            warn!(channel = %channel, %err, "training failed");
            ChannelOutcome {
                channel,
                status: JobStatus::Failed(err.to_string()),
                holiday_country: job.holiday_country.clone(),
                targets: job.targets.clone(),
                artifacts: None,
            }
        }
    }
}

/// Fan out one job per channel on the rayon pool and join at completion.
pub fn train_all<C>(jobs: &[ChannelJob], calendar: &C, config: &PipelineConfig) -> Vec<ChannelOutcome>
where
    C: HolidayCalendar + ?Sized,
{
    jobs.par_iter()
        .map(|job| train_channel(job, calendar, config))
        .collect()
}

fn run_pipeline<C>(
    job: &ChannelJob,
    calendar: &C,
    config: &PipelineConfig,
) -> Result<(ChannelArtifacts, bool)>
where
    C: HolidayCalendar + ?Sized,
{
    let series = &job.series;
    if series.len() < config.selector.min_history_days {
        return Err(ForecastError::InsufficientHistory {
            needed: config.selector.min_history_days,
            got: series.len(),
        });
    }

    let clipped = series.with_values(winsorize_iqr(series.values()))?;
    let profile = SeasonalProfile::extract(&clipped)?;
    let deseasonalized: Vec<f64> = profile
        .deseasonalize(&clipped)
        .into_iter()
        .map(|v| v.max(DESEASONALIZED_FLOOR))
        .collect();

    let (selection, used_fallback) = match select_model(&deseasonalized, &config.selector) {
        Ok(selection) => (selection, false),
        Err(ForecastError::FitNonConvergence) => {
            (fit_fallback(&deseasonalized, &config.selector)?, true)
        }
        Err(err) => return Err(err),
    };

    let model = TrainedModel::new(series.channel(), selection, profile, series.end());
    let mut forecast = model.forecast(config.horizon_days, config.confidence)?;

    if let Some(country) = &job.holiday_country {
        adjust_for_holidays(&mut forecast, country, calendar)?;
    }
    if !job.targets.is_empty() {
        apply_monthly_targets(&mut forecast, &job.targets)?;
    }

    // The backtest is best-effort: a series long enough to train may still be
    // too short to withhold the full holdout window.
    let backtest_report = if config.run_backtest {
        let bt_config = BacktestConfig {
            holdout_days: config.holdout_days,
            selector: config.selector.clone(),
        };
        match backtest(series, &bt_config) {
            Ok(report) => Some(report),
            Err(ForecastError::InsufficientHistory { .. }) => None,
            Err(err) => return Err(err),
        }
    } else {
        None
    };

    Ok((
        ChannelArtifacts {
            model,
            forecast,
            backtest: backtest_report,
        },
        used_fallback,
    ))
}

/// Versioned store of per-channel artifacts.
///
/// Retraining publishes a new version; readers take an `Arc` snapshot of the
/// current version, so they observe either the fully-old or the fully-new
/// model/forecast pair, never a mix. Superseded versions stay in the arena
/// until dropped with the store.
#[derive(Debug, Default)]
pub struct ModelStore {
    inner: RwLock<HashMap<String, Vec<Arc<ChannelArtifacts>>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new version for the channel and return its version number.
    pub fn publish(&self, mut artifacts: ChannelArtifacts) -> u32 {
        let channel = artifacts.model.channel().to_string();
        let mut inner = self.inner.write().expect("model store poisoned");
        let versions = inner.entry(channel).or_default();
        let version = versions.len() as u32;
        artifacts.model = artifacts.model.clone().with_version(version);
        versions.push(Arc::new(artifacts));
        version
    }

    /// Store every successful outcome of a batch; failed jobs are skipped.
    pub fn publish_outcomes(&self, outcomes: Vec<ChannelOutcome>) -> Vec<ChannelOutcome> {
        for outcome in &outcomes {
            if let Some(artifacts) = &outcome.artifacts {
                self.publish(artifacts.clone());
            }
        }
        outcomes
    }

    /// Snapshot of the channel's current artifacts.
    pub fn current(&self, channel: &str) -> Option<Arc<ChannelArtifacts>> {
        self.inner
            .read()
            .expect("model store poisoned")
            .get(channel)
            .and_then(|versions| versions.last().cloned())
    }

    /// Number of versions published for the channel.
    pub fn version_count(&self, channel: &str) -> usize {
        self.inner
            .read()
            .expect("model store poisoned")
            .get(channel)
            .map(|versions| versions.len())
            .unwrap_or(0)
    }

    /// Channels with at least one published version.
    pub fn channels(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .inner
            .read()
            .expect("model store poisoned")
            .keys()
            .cloned()
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedCalendar;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekday_series(channel: &str, days: usize) -> DailySeries {
        let start = d(2024, 1, 1); // Monday
        let values: Vec<f64> = (0..days)
            .map(|i| if i % 7 < 5 { 1000.0 } else { 400.0 })
            .collect();
        DailySeries::new(channel, start, values).unwrap()
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_horizon_days(90)
            .without_backtest()
    }

    #[test]
    fn channel_trains_end_to_end() {
        let job = ChannelJob::new(weekday_series("calls", 180));
        let calendar = FixedCalendar::new();

        let outcome = train_channel(&job, &calendar, &quick_config());
        assert_eq!(outcome.status, JobStatus::Completed);

        let artifacts = outcome.artifacts.unwrap();
        assert_eq!(artifacts.forecast.len(), 90);
        assert!(artifacts.forecast.point().iter().all(|&p| p >= 0.0));
        assert!(!artifacts.model.choice().is_fallback());
    }

    #[test]
    fn short_history_fails_cleanly() {
        let job = ChannelJob::new(weekday_series("calls", 20));
        let calendar = FixedCalendar::new();

        let outcome = train_channel(&job, &calendar, &quick_config());
        assert!(outcome.status.is_failed());
        assert!(outcome.artifacts.is_none());
    }

    #[test]
    fn invalid_holiday_country_fails_only_that_channel() {
        let jobs = vec![
            ChannelJob::new(weekday_series("calls", 180)),
            ChannelJob::new(weekday_series("emails", 180)).with_holiday_country("XX"),
        ];
        let calendar = FixedCalendar::new().with_country("MA", [d(2025, 1, 1)]);

        let outcomes = train_all(&jobs, &calendar, &quick_config());
        assert_eq!(outcomes.len(), 2);

        let calls = outcomes.iter().find(|o| o.channel == "calls").unwrap();
        let emails = outcomes.iter().find(|o| o.channel == "emails").unwrap();
        assert_eq!(calls.status, JobStatus::Completed);
        assert!(emails.status.is_failed());
    }

    #[test]
    fn holiday_and_targets_flow_through_training() {
        // Anchor is 2024-06-28; forecast starts June 29.
        let series = weekday_series("calls", 180);
        let holiday = d(2024, 7, 10);
        let job = ChannelJob::new(series)
            .with_holiday_country("MA")
            .with_target(MonthKey::new(2024, 8), 31000.0);
        let calendar = FixedCalendar::new().with_country("MA", [holiday]);

        let outcome = train_channel(&job, &calendar, &quick_config());
        let artifacts = outcome.artifacts.unwrap();
        let fs = &artifacts.forecast;

        let idx = fs.index_of(holiday).unwrap();
        assert_eq!(fs.point()[idx], 0.0);

        let august = fs.month_range(MonthKey::new(2024, 8)).unwrap();
        let total: f64 = fs.point()[august].iter().sum();
        assert!((total - 31000.0).abs() < 1e-6);
    }

    #[test]
    fn backtest_is_attached_when_history_allows() {
        let job = ChannelJob::new(weekday_series("calls", 400));
        let calendar = FixedCalendar::new();
        let config = PipelineConfig::default().with_horizon_days(60);

        let outcome = train_channel(&job, &calendar, &config);
        let artifacts = outcome.artifacts.unwrap();
        let report = artifacts.backtest.unwrap();
        assert_eq!(report.points.len(), 60);
    }

    #[test]
    fn store_versions_supersede_atomically() {
        let store = ModelStore::new();
        let calendar = FixedCalendar::new();
        let job = ChannelJob::new(weekday_series("calls", 180));

        let first = train_channel(&job, &calendar, &quick_config());
        store.publish(first.artifacts.unwrap());
        let v0 = store.current("calls").unwrap();
        assert_eq!(v0.model.version(), 0);

        let second = train_channel(&job, &calendar, &quick_config());
        store.publish(second.artifacts.unwrap());

        let v1 = store.current("calls").unwrap();
        assert_eq!(v1.model.version(), 1);
        assert_eq!(store.version_count("calls"), 2);

        // The old snapshot is still intact for readers that hold it.
        assert_eq!(v0.model.version(), 0);
        assert_eq!(v0.forecast.len(), 90);
    }

    #[test]
    fn train_all_reports_every_channel() {
        let jobs: Vec<ChannelJob> = ["calls", "emails", "chat"]
            .iter()
            .map(|name| ChannelJob::new(weekday_series(name, 180)))
            .collect();
        let calendar = FixedCalendar::new();

        let store = ModelStore::new();
        let outcomes = store.publish_outcomes(train_all(&jobs, &calendar, &quick_config()));

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| !o.status.is_failed()));
        assert_eq!(store.channels(), vec!["calls", "chat", "emails"]);
    }
}

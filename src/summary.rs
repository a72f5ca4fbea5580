//! Monthly aggregation views for presentation collaborators.

use std::collections::BTreeMap;

use crate::core::{DailySeries, ForecastSeries, MonthKey};

/// One month's aggregated volume.
///
/// For historical data the bounds simply repeat the total.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub total: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Sum a forecast by calendar month, bounds included.
pub fn monthly_forecast(forecast: &ForecastSeries) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<MonthKey, (f64, f64, f64)> = BTreeMap::new();
    for day in forecast.iter() {
        let entry = months.entry(MonthKey::of(day.date)).or_insert((0.0, 0.0, 0.0));
        entry.0 += day.point;
        entry.1 += day.lower;
        entry.2 += day.upper;
    }
    months
        .into_iter()
        .map(|(month, (total, lower, upper))| MonthlyAggregate {
            month,
            total,
            lower,
            upper,
        })
        .collect()
}

/// Sum a historical series by calendar month.
pub fn monthly_history(series: &DailySeries) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for (date, volume) in series.iter() {
        *months.entry(MonthKey::of(date)).or_insert(0.0) += volume;
    }
    months
        .into_iter()
        .map(|(month, total)| MonthlyAggregate {
            month,
            total,
            lower: total,
            upper: total,
        })
        .collect()
}

/// Channel-level headline figures comparing history with the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub channel: String,
    pub hist_avg_daily: f64,
    pub forecast_avg_daily: f64,
    /// Forecast average versus historical average, in percent.
    pub change_pct: f64,
    pub forecast_total: f64,
    pub peak_month: Option<MonthKey>,
    pub trough_month: Option<MonthKey>,
}

/// Summarize a channel from its history and current forecast.
pub fn summarize(series: &DailySeries, forecast: &ForecastSeries) -> ChannelSummary {
    let hist_avg_daily = series.values().iter().sum::<f64>() / series.len() as f64;
    let forecast_total = forecast.total();
    let forecast_avg_daily = forecast_total / forecast.len() as f64;
    let change_pct = if hist_avg_daily > 0.0 {
        (forecast_avg_daily / hist_avg_daily - 1.0) * 100.0
    } else {
        0.0
    };

    let months = monthly_forecast(forecast);
    let peak_month = months
        .iter()
        .max_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(std::cmp::Ordering::Equal))
        .map(|m| m.month);
    let trough_month = months
        .iter()
        .min_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(std::cmp::Ordering::Equal))
        .map(|m| m.month);

    ChannelSummary {
        channel: series.channel().to_string(),
        hist_avg_daily,
        forecast_avg_daily,
        change_pct,
        forecast_total,
        peak_month,
        trough_month,
    }
}

//! Seasonal shape extraction: day-of-week and month-of-year factors.

use chrono::{Datelike, NaiveDate};

use crate::core::DailySeries;
use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, median};

/// Minimum number of daily observations required to extract a pattern.
pub const MIN_PATTERN_DAYS: usize = 14;

/// Multiplicative seasonal shape of one channel's volume.
///
/// Day-of-week factors describe how each weekday relates to its surrounding
/// week; month factors describe how each calendar month relates to the
/// overall level. Month factors are normalized so the twelve average to 1.0,
/// which keeps de-seasonalisation level-neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalProfile {
    weekday: [f64; 7],
    month: [f64; 12],
}

impl SeasonalProfile {
    /// Extract the profile from a channel's history.
    ///
    /// Weekday factors are the per-weekday median of each observation's ratio
    /// to its centered 7-day window mean; the median keeps isolated spikes
    /// from dragging a whole weekday up. Months never observed fall back to a
    /// neutral factor before normalization.
    pub fn extract(series: &DailySeries) -> Result<Self> {
        if series.len() < MIN_PATTERN_DAYS {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_PATTERN_DAYS,
                got: series.len(),
            });
        }

        let values = series.values();
        let n = values.len();

        // Day-of-week: ratio of each day to its local week.
        let mut by_weekday: [Vec<f64>; 7] = Default::default();
        for i in 0..n {
            let lo = i.saturating_sub(3);
            let hi = (i + 4).min(n);
            let local = mean(&values[lo..hi]);
            if local > 0.0 {
                let dow = series.date_at(i).weekday().num_days_from_monday() as usize;
                by_weekday[dow].push(values[i] / local);
            }
        }
        let mut weekday = [1.0_f64; 7];
        for (dow, ratios) in by_weekday.iter().enumerate() {
            if !ratios.is_empty() {
                weekday[dow] = median(ratios);
            }
        }

        // Month-of-year: monthly mean over overall mean, normalized to
        // average exactly 1.0 across the twelve months.
        let overall = mean(values);
        let mut month = [1.0_f64; 12];
        if overall > 0.0 {
            let mut sums = [0.0_f64; 12];
            let mut counts = [0usize; 12];
            for (date, value) in series.iter() {
                let m = date.month0() as usize;
                sums[m] += value;
                counts[m] += 1;
            }
            for m in 0..12 {
                if counts[m] > 0 {
                    month[m] = (sums[m] / counts[m] as f64) / overall;
                }
            }
            let avg = month.iter().sum::<f64>() / 12.0;
            if avg > 0.0 {
                for f in &mut month {
                    *f /= avg;
                }
            }
        }

        Ok(Self { weekday, month })
    }

    /// A degenerate flat profile (all factors 1.0), used when history is too
    /// short and the caller chooses to proceed anyway.
    pub fn flat() -> Self {
        Self {
            weekday: [1.0; 7],
            month: [1.0; 12],
        }
    }

    /// Factor for a day of week (0 = Monday .. 6 = Sunday).
    pub fn weekday_factor(&self, weekday_from_monday: usize) -> f64 {
        self.weekday[weekday_from_monday % 7]
    }

    /// Factor for a calendar month (1 = January .. 12 = December).
    pub fn month_factor(&self, month: u32) -> f64 {
        self.month[(month.clamp(1, 12) - 1) as usize]
    }

    /// Month factor for a specific date.
    pub fn month_factor_for(&self, date: NaiveDate) -> f64 {
        self.month_factor(date.month())
    }

    /// Divide each observation by its month factor.
    ///
    /// The weekly cycle is left in the data for the smoothing model; only the
    /// slower annual shape is removed here and re-applied at forecast time.
    pub fn deseasonalize(&self, series: &DailySeries) -> Vec<f64> {
        series
            .iter()
            .map(|(date, value)| {
                let f = self.month_factor_for(date);
                if f > 0.0 {
                    value / f
                } else {
                    value
                }
            })
            .collect()
    }
}

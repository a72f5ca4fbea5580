//! Daily observation series for a single contact channel.

use chrono::{Days, NaiveDate};

use crate::error::{ForecastError, Result};

/// One channel's history of daily contact volumes on a contiguous calendar
/// grid.
///
/// The grid invariant is enforced at construction: dates are strictly
/// increasing with no duplicates and no gaps. Upstream ingestion decides how
/// gaps are resolved; [`DailySeries::from_observations_zero_filled`] makes the
/// zero-fill policy explicit for callers that want it.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    channel: String,
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series from a start date and one value per consecutive day.
    pub fn new(channel: impl Into<String>, start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "volumes must be finite and non-negative, got {bad}"
            )));
        }
        Ok(Self {
            channel: channel.into(),
            start,
            values,
        })
    }

    /// Build a series from dated observations.
    ///
    /// Observations are sorted by date first. A repeated date is
    /// [`ForecastError::DuplicateDate`]; a skipped day is
    /// [`ForecastError::DateGap`].
    pub fn from_observations(
        channel: impl Into<String>,
        mut observations: Vec<(NaiveDate, f64)>,
    ) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        observations.sort_by_key(|(date, _)| *date);

        let start = observations[0].0;
        let mut values = Vec::with_capacity(observations.len());
        let mut expected = start;
        for (date, volume) in observations {
            if date == expected {
                values.push(volume);
            } else if date < expected {
                return Err(ForecastError::DuplicateDate(date));
            } else {
                return Err(ForecastError::DateGap {
                    expected,
                    got: date,
                });
            }
            expected = next_day(expected);
        }
        Self::new(channel, start, values)
    }

    /// Build a series from dated observations, filling missing days with zero
    /// volume.
    ///
    /// Duplicate dates are still rejected.
    pub fn from_observations_zero_filled(
        channel: impl Into<String>,
        mut observations: Vec<(NaiveDate, f64)>,
    ) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        observations.sort_by_key(|(date, _)| *date);

        let start = observations[0].0;
        let mut values = Vec::new();
        let mut expected = start;
        for (date, volume) in observations {
            if date < expected {
                return Err(ForecastError::DuplicateDate(date));
            }
            while expected < date {
                values.push(0.0);
                expected = next_day(expected);
            }
            values.push(volume);
            expected = next_day(expected);
        }
        Self::new(channel, start, values)
    }

    /// The channel identifier.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// First observed date.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last observed date.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    /// Number of daily observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observed volumes, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Date of the observation at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        assert!(index < self.values.len(), "index {index} out of bounds");
        self.start
            .checked_add_days(Days::new(index as u64))
            .expect("date arithmetic overflow")
    }

    /// Iterate over `(date, volume)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.date_at(i), v))
    }

    /// Replace the values, keeping channel and dates.
    ///
    /// Used by training preparation (winsorisation) where the calendar grid
    /// must stay aligned with the original observations.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "replacement values must keep length {}, got {}",
                self.values.len(),
                values.len()
            )));
        }
        Self::new(self.channel.clone(), self.start, values)
    }

    /// Split into a training prefix and a holdout suffix of `tail_len` days.
    pub fn split_at_tail(&self, tail_len: usize) -> Result<(DailySeries, DailySeries)> {
        if tail_len == 0 || tail_len >= self.values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "holdout length must be in 1..{}, got {tail_len}",
                self.values.len()
            )));
        }
        let split = self.values.len() - tail_len;
        let head = Self {
            channel: self.channel.clone(),
            start: self.start,
            values: self.values[..split].to_vec(),
        };
        let tail = Self {
            channel: self.channel.clone(),
            start: self.date_at(split),
            values: self.values[split..].to_vec(),
        };
        Ok((head, tail))
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().expect("date arithmetic overflow")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn series_constructs_from_contiguous_observations() {
        let obs = vec![(d(2024, 1, 1), 10.0), (d(2024, 1, 2), 20.0), (d(2024, 1, 3), 30.0)];
        let series = DailySeries::from_observations("calls", obs).unwrap();

        assert_eq!(series.channel(), "calls");
        assert_eq!(series.len(), 3);
        assert_eq!(series.start(), d(2024, 1, 1));
        assert_eq!(series.end(), d(2024, 1, 3));
        assert_eq!(series.values(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn series_sorts_unordered_observations() {
        let obs = vec![(d(2024, 1, 2), 20.0), (d(2024, 1, 1), 10.0)];
        let series = DailySeries::from_observations("calls", obs).unwrap();
        assert_eq!(series.values(), &[10.0, 20.0]);
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let obs = vec![(d(2024, 1, 1), 10.0), (d(2024, 1, 1), 20.0)];
        let result = DailySeries::from_observations("calls", obs);
        assert!(matches!(result, Err(ForecastError::DuplicateDate(_))));
    }

    #[test]
    fn series_rejects_gaps() {
        let obs = vec![(d(2024, 1, 1), 10.0), (d(2024, 1, 3), 30.0)];
        let result = DailySeries::from_observations("calls", obs);
        assert!(matches!(
            result,
            Err(ForecastError::DateGap { expected, got })
                if expected == d(2024, 1, 2) && got == d(2024, 1, 3)
        ));
    }

    #[test]
    fn series_zero_fills_gaps_when_asked() {
        let obs = vec![(d(2024, 1, 1), 10.0), (d(2024, 1, 4), 40.0)];
        let series = DailySeries::from_observations_zero_filled("calls", obs).unwrap();
        assert_eq!(series.values(), &[10.0, 0.0, 0.0, 40.0]);
        assert_eq!(series.end(), d(2024, 1, 4));
    }

    #[test]
    fn series_rejects_negative_and_non_finite_volumes() {
        assert!(DailySeries::new("calls", d(2024, 1, 1), vec![1.0, -2.0]).is_err());
        assert!(DailySeries::new("calls", d(2024, 1, 1), vec![f64::NAN]).is_err());
        assert!(matches!(
            DailySeries::new("calls", d(2024, 1, 1), vec![]),
            Err(ForecastError::EmptyData)
        ));
    }

    #[test]
    fn series_split_at_tail() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let series = DailySeries::new("calls", d(2024, 1, 1), values).unwrap();

        let (head, tail) = series.split_at_tail(3).unwrap();
        assert_eq!(head.len(), 7);
        assert_eq!(tail.len(), 3);
        assert_eq!(head.end(), d(2024, 1, 7));
        assert_eq!(tail.start(), d(2024, 1, 8));
        assert_eq!(tail.values(), &[7.0, 8.0, 9.0]);

        assert!(series.split_at_tail(0).is_err());
        assert!(series.split_at_tail(10).is_err());
    }

    #[test]
    fn series_iterates_dated_values() {
        let series = DailySeries::new("calls", d(2024, 2, 28), vec![1.0, 2.0]).unwrap();
        let pairs: Vec<_> = series.iter().collect();
        assert_eq!(pairs, vec![(d(2024, 2, 28), 1.0), (d(2024, 2, 29), 2.0)]);
    }
}

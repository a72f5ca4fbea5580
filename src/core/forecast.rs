//! Forecast sequence: dated point estimates with interval bounds.

use std::ops::Range;

use chrono::{Days, NaiveDate};

use crate::core::MonthKey;
use crate::error::{ForecastError, Result};

/// One forecast day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A contiguous daily forecast for one channel.
///
/// Produced by the generator; the holiday adjuster and the monthly target
/// distributor mutate it in place as explicit transformation steps. Nothing
/// else writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    start: NaiveDate,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ForecastSeries {
    /// Create a forecast from parallel point/lower/upper columns.
    pub fn new(
        start: NaiveDate,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        if point.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if point.len() != lower.len() || point.len() != upper.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "bound columns must match point column length {}",
                point.len()
            )));
        }
        Ok(Self {
            start,
            point,
            lower,
            upper,
        })
    }

    /// First forecast date.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last forecast date.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.point.len() - 1)
    }

    /// Number of forecast days.
    pub fn len(&self) -> usize {
        self.point.len()
    }

    /// Whether the forecast holds no days.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point estimates.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Mutable point estimates, for the adjustment steps.
    pub fn point_mut(&mut self) -> &mut [f64] {
        &mut self.point
    }

    /// Mutable lower bounds.
    pub fn lower_mut(&mut self) -> &mut [f64] {
        &mut self.lower
    }

    /// Mutable upper bounds.
    pub fn upper_mut(&mut self) -> &mut [f64] {
        &mut self.upper
    }

    /// Date of the forecast day at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        assert!(index < self.point.len(), "index {index} out of bounds");
        self.start
            .checked_add_days(Days::new(index as u64))
            .expect("date arithmetic overflow")
    }

    /// Index of `date` within the forecast, if covered.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start {
            return None;
        }
        let offset = (date - self.start).num_days() as usize;
        (offset < self.point.len()).then_some(offset)
    }

    /// Index range of the days belonging to `month`, or `None` when the
    /// forecast does not touch that month.
    pub fn month_range(&self, month: MonthKey) -> Option<Range<usize>> {
        let first = (0..self.point.len()).find(|&i| month.contains(self.date_at(i)))?;
        let end = (first..self.point.len())
            .find(|&i| !month.contains(self.date_at(i)))
            .unwrap_or(self.point.len());
        Some(first..end)
    }

    /// Sum of point estimates over the whole horizon.
    pub fn total(&self) -> f64 {
        self.point.iter().sum()
    }

    /// Iterate over forecast days.
    pub fn iter(&self) -> impl Iterator<Item = ForecastPoint> + '_ {
        (0..self.point.len()).map(|i| ForecastPoint {
            date: self.date_at(i),
            point: self.point[i],
            lower: self.lower[i],
            upper: self.upper[i],
        })
    }
}

//! Holiday zeroing with volume redistribution.
//!
//! Contact centres close on bank holidays, but the demand does not vanish;
//! it shifts onto the surrounding working days. The adjuster zeroes every
//! holiday date and moves the removed volume onto the rest of that ISO week
//! (falling back to the nearest non-holiday days), weighted by each
//! recipient's pre-adjustment estimate so naturally busy days absorb more.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::calendar::HolidayCalendar;
use crate::core::ForecastSeries;
use crate::error::Result;

/// Summary of one adjustment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayAdjustment {
    /// Dates that were zeroed.
    pub zeroed: Vec<NaiveDate>,
    /// Total volume moved onto recipient days.
    pub moved_volume: f64,
}

impl HolidayAdjustment {
    /// Whether the pass changed anything.
    pub fn is_noop(&self) -> bool {
        self.zeroed.is_empty()
    }
}

/// Zero every holiday of `country` inside the forecast range and
/// redistribute the removed volume.
///
/// Point-estimate totals are conserved: the sum over the whole sequence is
/// unchanged up to floating-point error, except in the degenerate case where
/// every day in the sequence is a holiday and no recipient exists. Bounds are
/// recomputed around the new point estimates rather than conserved.
///
/// The forecast is untouched when the calendar rejects the country code.
pub fn adjust_for_holidays<C>(
    forecast: &mut ForecastSeries,
    country: &str,
    calendar: &C,
) -> Result<HolidayAdjustment>
where
    C: HolidayCalendar + ?Sized,
{
    let years = forecast.start().year()..=forecast.end().year();
    let holidays = calendar.holidays(country, years)?;

    let n = forecast.len();
    let is_holiday: Vec<bool> = (0..n)
        .map(|i| holidays.contains(&forecast.date_at(i)))
        .collect();
    if !is_holiday.iter().any(|&h| h) {
        return Ok(HolidayAdjustment {
            zeroed: Vec::new(),
            moved_volume: 0.0,
        });
    }

    let pre_point = forecast.point().to_vec();
    let pre_lower = forecast.lower().to_vec();
    let pre_upper = forecast.upper().to_vec();

    let mut point = pre_point.clone();
    let mut zeroed = Vec::new();
    let mut moved_volume = 0.0;

    for i in 0..n {
        if is_holiday[i] {
            point[i] = 0.0;
            zeroed.push(forecast.date_at(i));
        }
    }

    // Each holiday independently hands its pre-adjustment volume to its
    // recipients; shares accumulate when windows overlap.
    for i in 0..n {
        if !is_holiday[i] {
            continue;
        }
        let removed = pre_point[i];
        if removed <= 0.0 {
            continue;
        }

        let recipients = recipient_indices(forecast, &is_holiday, i);
        if recipients.is_empty() {
            debug!(date = %forecast.date_at(i), "no recipient days; removed volume dropped");
            continue;
        }

        let weight_total: f64 = recipients.iter().map(|&j| pre_point[j]).sum();
        for &j in &recipients {
            let share = if weight_total > 0.0 {
                removed * pre_point[j] / weight_total
            } else {
                removed / recipients.len() as f64
            };
            point[j] += share;
        }
        moved_volume += removed;
    }

    // Bounds: zero on holidays; recipients keep their pre-adjustment
    // relative interval width around the shifted point estimate.
    let mut lower = pre_lower.clone();
    let mut upper = pre_upper.clone();
    for i in 0..n {
        if is_holiday[i] {
            lower[i] = 0.0;
            upper[i] = 0.0;
        } else if point[i] != pre_point[i] {
            if pre_point[i] > 0.0 {
                let relative_half = (pre_upper[i] - pre_lower[i]) / (2.0 * pre_point[i]);
                lower[i] = (point[i] * (1.0 - relative_half)).max(0.0);
                upper[i] = point[i] * (1.0 + relative_half);
            } else {
                lower[i] = point[i];
                upper[i] = point[i];
            }
        }
    }

    forecast.point_mut().copy_from_slice(&point);
    forecast.lower_mut().copy_from_slice(&lower);
    forecast.upper_mut().copy_from_slice(&upper);

    Ok(HolidayAdjustment {
        zeroed,
        moved_volume,
    })
}

/// Non-holiday indices eligible to receive volume from the holiday at `i`:
/// the rest of its ISO week inside the sequence, else the nearest
/// non-holiday day on each side.
fn recipient_indices(forecast: &ForecastSeries, is_holiday: &[bool], i: usize) -> Vec<usize> {
    let n = is_holiday.len();
    let dow = forecast.date_at(i).weekday().num_days_from_monday() as i64;
    let monday = i as i64 - dow;

    let mut week: Vec<usize> = (monday..monday + 7)
        .filter(|&j| j >= 0 && (j as usize) < n)
        .map(|j| j as usize)
        .filter(|&j| !is_holiday[j])
        .collect();
    if !week.is_empty() {
        return week;
    }

    if let Some(left) = (0..i).rev().find(|&j| !is_holiday[j]) {
        week.push(left);
    }
    if let Some(right) = (i + 1..n).find(|&j| !is_holiday[j]) {
        week.push(right);
    }
    week
}

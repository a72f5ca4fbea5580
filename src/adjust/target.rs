//! Monthly target conformance: rescale a month's forecast to a client total.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::{ForecastSeries, MonthKey};
use crate::error::{ForecastError, Result};

/// Scale every targeted month so its point-estimate total equals the target.
///
/// The scale factor multiplies points and both bounds, so relative
/// day-of-week shape survives and zeroed holiday days stay at zero. Months
/// without a target, and targets for months outside the horizon, are left
/// alone. A targeted month whose base total is zero cannot be scaled; the
/// whole call is rejected with [`ForecastError::NonDistributableTarget`]
/// before any month is modified.
pub fn apply_monthly_targets(
    forecast: &mut ForecastSeries,
    targets: &BTreeMap<MonthKey, f64>,
) -> Result<()> {
    // Validate every applicable month first so a rejection never leaves the
    // forecast half-scaled.
    let mut plan: Vec<(MonthKey, std::ops::Range<usize>, f64)> = Vec::new();
    for (&month, &target) in targets {
        if target < 0.0 || !target.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "monthly target for {month} must be finite and non-negative, got {target}"
            )));
        }
        let Some(range) = forecast.month_range(month) else {
            continue;
        };
        let base: f64 = forecast.point()[range.clone()].iter().sum();
        if base == 0.0 {
            return Err(ForecastError::NonDistributableTarget { month });
        }
        plan.push((month, range, target / base));
    }

    for (month, range, scale) in plan {
        debug!(%month, scale, "applying monthly target");
        for i in range {
            forecast.point_mut()[i] *= scale;
            forecast.lower_mut()[i] *= scale;
            forecast.upper_mut()[i] *= scale;
        }
    }
    Ok(())
}

/// Round a targeted month's point estimates to whole contacts while keeping
/// the month total exactly `target` (rounded to the nearest integer).
///
/// Each day is rounded to the nearest integer and the leftover difference is
/// absorbed by the month's largest day. Call after
/// [`apply_monthly_targets`] when integral output is required.
pub fn conform_integral(
    forecast: &mut ForecastSeries,
    month: MonthKey,
    target: f64,
) -> Result<()> {
    let range = forecast
        .month_range(month)
        .ok_or_else(|| ForecastError::InvalidParameter(format!(
            "month {month} is outside the forecast range"
        )))?;

    let goal = target.round();
    let points = forecast.point_mut();

    let mut sum = 0.0;
    let mut largest = range.start;
    for i in range.clone() {
        points[i] = points[i].round();
        sum += points[i];
        if points[i] > points[largest] {
            largest = i;
        }
    }

    let residual = goal - sum;
    if residual != 0.0 {
        if points[largest] + residual < 0.0 {
            return Err(ForecastError::NonDistributableTarget { month });
        }
        points[largest] += residual;
    }
    Ok(())
}

//! Property-based tests for the adjustment and forecasting invariants.
//!
//! These verify properties that should hold for all valid inputs, using
//! randomly generated series, holiday sets and targets.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use contact_forecast::prelude::*;
use proptest::prelude::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn make_forecast(start: NaiveDate, point: Vec<f64>) -> ForecastSeries {
    let lower: Vec<f64> = point.iter().map(|p| p * 0.85).collect();
    let upper: Vec<f64> = point.iter().map(|p| p * 1.15).collect();
    ForecastSeries::new(start, point, lower, upper).unwrap()
}

/// Daily volumes that stay comfortably positive.
fn volume_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(50.0..2000.0_f64, min_len..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn holiday_adjustment_conserves_total_volume(
        point in volume_strategy(14, 60),
        seed_mask in prop::collection::vec(prop::bool::weighted(0.2), 60)
    ) {
        let start = d(2025, 3, 3); // a Monday
        let mask = {
            let mut m: Vec<bool> = seed_mask.into_iter().take(point.len()).collect();
            m.resize(point.len(), false);
            m[0] = false;
            m
        };
        let holidays: Vec<NaiveDate> = mask
            .iter()
            .enumerate()
            .filter(|(_, &h)| h)
            .map(|(i, _)| start + Days::new(i as u64))
            .collect();
        let calendar = FixedCalendar::new().with_country("MA", holidays.clone());

        let mut fs = make_forecast(start, point);
        let total_before = fs.total();
        adjust_for_holidays(&mut fs, "MA", &calendar).unwrap();

        // Conservation within floating-point tolerance.
        prop_assert!((fs.total() - total_before).abs() < 1e-6 * total_before.max(1.0));

        // Every holiday date is exactly zero.
        for date in holidays {
            let idx = fs.index_of(date).unwrap();
            prop_assert_eq!(fs.point()[idx], 0.0);
            prop_assert_eq!(fs.lower()[idx], 0.0);
            prop_assert_eq!(fs.upper()[idx], 0.0);
        }

        // No negative values appear anywhere.
        prop_assert!(fs.point().iter().all(|&p| p >= 0.0));
        prop_assert!(fs.lower().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn monthly_target_is_met_exactly(
        point in volume_strategy(31, 32),
        target in 1000.0..200_000.0_f64
    ) {
        let month = MonthKey::new(2025, 3);
        let mut fs = make_forecast(d(2025, 3, 1), point);
        let targets = BTreeMap::from([(month, target)]);

        apply_monthly_targets(&mut fs, &targets).unwrap();
        let range = fs.month_range(month).unwrap();
        let total: f64 = fs.point()[range].iter().sum();
        prop_assert!((total - target).abs() < 1e-6 * target);

        // Integral conformance lands on the rounded target exactly.
        conform_integral(&mut fs, month, target).unwrap();
        let range = fs.month_range(month).unwrap();
        let total: f64 = fs.point()[range].iter().sum();
        prop_assert_eq!(total, target.round());
    }

    #[test]
    fn target_application_is_idempotent(
        point in volume_strategy(31, 32),
        target in 1000.0..200_000.0_f64
    ) {
        let month = MonthKey::new(2025, 3);
        let mut fs = make_forecast(d(2025, 3, 1), point);
        let targets = BTreeMap::from([(month, target)]);

        apply_monthly_targets(&mut fs, &targets).unwrap();
        let once = fs.clone();
        apply_monthly_targets(&mut fs, &targets).unwrap();

        for i in 0..fs.len() {
            prop_assert!((fs.point()[i] - once.point()[i]).abs() < 1e-9 * once.point()[i].max(1.0));
        }
    }

    #[test]
    fn target_then_holiday_shape_survives_scaling(
        point in volume_strategy(31, 32),
        zero_day in 0usize..31
    ) {
        // A zeroed day stays zero through target application.
        let month = MonthKey::new(2025, 3);
        let mut point = point;
        point[zero_day] = 0.0;
        let mut fs = make_forecast(d(2025, 3, 1), point);
        let targets = BTreeMap::from([(month, 50_000.0)]);

        apply_monthly_targets(&mut fs, &targets).unwrap();
        prop_assert_eq!(fs.point()[zero_day], 0.0);
    }
}

proptest! {
    // Model fitting is the expensive part; fewer cases keep the suite quick.
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn forecast_horizon_and_floor_hold_for_positive_series(
        values in volume_strategy(60, 120),
        horizon in 1usize..90
    ) {
        let series = DailySeries::new("calls", d(2024, 1, 1), values).unwrap();
        let job = ChannelJob::new(series);
        let calendar = FixedCalendar::new();
        let config = PipelineConfig::default()
            .with_horizon_days(horizon)
            .without_backtest();

        let outcome = train_channel(&job, &calendar, &config);
        let artifacts = outcome.artifacts.expect("training should succeed");

        prop_assert_eq!(artifacts.forecast.len(), horizon);
        prop_assert!(artifacts.forecast.point().iter().all(|&p| p >= 0.0));
        if let Some(aic) = artifacts.model.aic() {
            prop_assert!(aic.is_finite());
        }
    }
}

//! Holiday calendar abstraction.
//!
//! Holiday dates come from an external calendar collaborator keyed by
//! country code and year. The core only needs membership testing, so the
//! trait returns plain date sets; [`CachedCalendar`] makes sure each
//! (country, year) pair is resolved once per run.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;
use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};

use crate::error::{ForecastError, Result};

/// Source of holiday dates for a country.
pub trait HolidayCalendar: Send + Sync {
    /// All holiday dates for `country` within the year range.
    ///
    /// An unknown country code is [`ForecastError::InvalidCountryCode`];
    /// implementations must not silently return an empty set for it.
    fn holidays(&self, country: &str, years: RangeInclusive<i32>) -> Result<BTreeSet<NaiveDate>>;
}

/// In-memory calendar built from known date tables.
///
/// This is the adapter point for the external calendar service: resolve the
/// dates out-of-process, then hand the core a `FixedCalendar`.
#[derive(Debug, Clone, Default)]
pub struct FixedCalendar {
    table: HashMap<String, BTreeSet<NaiveDate>>,
}

impl FixedCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or extend) a country's holiday dates.
    pub fn with_country(
        mut self,
        country: impl Into<String>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.table
            .entry(country.into())
            .or_default()
            .extend(dates);
        self
    }

    /// Country codes this calendar can resolve.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(|s| s.as_str())
    }
}

impl HolidayCalendar for FixedCalendar {
    fn holidays(&self, country: &str, years: RangeInclusive<i32>) -> Result<BTreeSet<NaiveDate>> {
        let all = self
            .table
            .get(country)
            .ok_or_else(|| ForecastError::InvalidCountryCode(country.to_string()))?;
        Ok(all
            .iter()
            .filter(|d| years.contains(&d.year()))
            .copied()
            .collect())
    }
}

/// Caches an inner calendar per (country, year) for the lifetime of a run.
pub struct CachedCalendar<C> {
    inner: C,
    cache: Mutex<HashMap<(String, i32), BTreeSet<NaiveDate>>>,
}

impl<C: HolidayCalendar> CachedCalendar<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<C: HolidayCalendar> HolidayCalendar for CachedCalendar<C> {
    fn holidays(&self, country: &str, years: RangeInclusive<i32>) -> Result<BTreeSet<NaiveDate>> {
        let mut out = BTreeSet::new();
        let mut cache = self.cache.lock().expect("calendar cache poisoned");
        for year in years {
            let key = (country.to_string(), year);
            if let Some(dates) = cache.get(&key) {
                out.extend(dates.iter().copied());
                continue;
            }
            let dates = self.inner.holidays(country, year..=year)?;
            out.extend(dates.iter().copied());
            cache.insert(key, dates);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn morocco() -> FixedCalendar {
        FixedCalendar::new().with_country(
            "MA",
            [d(2025, 1, 1), d(2025, 1, 11), d(2025, 7, 30), d(2026, 1, 1)],
        )
    }

    #[test]
    fn fixed_calendar_filters_by_year() {
        let calendar = morocco();
        let dates = calendar.holidays("MA", 2025..=2025).unwrap();
        assert_eq!(dates.len(), 3);
        assert!(dates.contains(&d(2025, 7, 30)));
        assert!(!dates.contains(&d(2026, 1, 1)));

        let both = calendar.holidays("MA", 2025..=2026).unwrap();
        assert_eq!(both.len(), 4);
    }

    #[test]
    fn unknown_country_is_an_error() {
        let calendar = morocco();
        assert!(matches!(
            calendar.holidays("XX", 2025..=2025),
            Err(ForecastError::InvalidCountryCode(code)) if code == "XX"
        ));
    }

    struct CountingCalendar {
        inner: FixedCalendar,
        calls: AtomicUsize,
    }

    impl HolidayCalendar for CountingCalendar {
        fn holidays(
            &self,
            country: &str,
            years: RangeInclusive<i32>,
        ) -> Result<BTreeSet<NaiveDate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.holidays(country, years)
        }
    }

    #[test]
    fn cached_calendar_resolves_each_year_once() {
        let counting = CountingCalendar {
            inner: morocco(),
            calls: AtomicUsize::new(0),
        };
        let cached = CachedCalendar::new(counting);

        let first = cached.holidays("MA", 2025..=2026).unwrap();
        assert_eq!(first.len(), 4);
        let second = cached.holidays("MA", 2025..=2026).unwrap();
        assert_eq!(second, first);

        // Two years resolved on the first call, nothing after.
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_calendar_propagates_invalid_codes() {
        let cached = CachedCalendar::new(morocco());
        assert!(matches!(
            cached.holidays("ZZ", 2025..=2025),
            Err(ForecastError::InvalidCountryCode(_))
        ));
    }
}

//! Core data structures: daily series, forecast sequences and month keys.

mod forecast;
mod month;
mod series;

pub use forecast::{ForecastPoint, ForecastSeries};
pub use month::MonthKey;
pub use series::DailySeries;

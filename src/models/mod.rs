//! Model configuration, fitting, selection and the trained-model wrapper.

mod baseline;
mod config;
mod selector;
mod smoothing;
mod trained;

pub use baseline::SeasonalAverage;
pub use config::{ModelChoice, ModelConfig, SeasonalKind, TrendKind};
pub use selector::{fit_fallback, select_model, FittedEngine, Selection, SelectorConfig};
pub use smoothing::HoltWinters;
pub use trained::TrainedModel;

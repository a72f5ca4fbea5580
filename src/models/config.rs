//! Model configuration tags consumed by the smoothing engine.

use std::fmt;

/// Trend component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendKind {
    /// No trend component.
    #[default]
    None,
    /// Additive (linear) trend.
    Additive,
}

/// Seasonal component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalKind {
    /// No seasonal component.
    #[default]
    None,
    /// Additive weekly seasonality.
    Additive,
    /// Multiplicative weekly seasonality; requires strictly positive data.
    Multiplicative,
}

/// One candidate smoothing configuration.
///
/// A tagged value rather than a type per combination: the whole search space
/// stays enumerable and a single fitting routine consumes the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelConfig {
    pub trend: TrendKind,
    pub seasonal: SeasonalKind,
    /// Damped trend; only meaningful when `trend` is not `None`.
    pub damped: bool,
}

impl ModelConfig {
    pub fn new(trend: TrendKind, seasonal: SeasonalKind, damped: bool) -> Self {
        Self {
            trend,
            seasonal,
            damped,
        }
    }

    /// The full candidate search space, in tie-break order.
    ///
    /// Undamped configurations come before damped ones and simpler seasonal
    /// forms come first, so an AIC tie resolves toward the simpler model.
    /// Multiplicative candidates are omitted when the data cannot support
    /// them (any zero or negative value).
    pub fn candidates(allow_multiplicative: bool) -> Vec<ModelConfig> {
        let seasonal_kinds: &[SeasonalKind] = if allow_multiplicative {
            &[
                SeasonalKind::None,
                SeasonalKind::Additive,
                SeasonalKind::Multiplicative,
            ]
        } else {
            &[SeasonalKind::None, SeasonalKind::Additive]
        };

        let mut out = Vec::new();
        for &seasonal in seasonal_kinds {
            out.push(ModelConfig::new(TrendKind::None, seasonal, false));
        }
        for &damped in &[false, true] {
            for &seasonal in seasonal_kinds {
                out.push(ModelConfig::new(TrendKind::Additive, seasonal, damped));
            }
        }
        out
    }

    pub fn has_trend(&self) -> bool {
        !matches!(self.trend, TrendKind::None)
    }

    pub fn has_seasonal(&self) -> bool {
        !matches!(self.seasonal, SeasonalKind::None)
    }

    pub fn is_damped(&self) -> bool {
        self.damped && self.has_trend()
    }

    /// Number of free smoothing parameters (alpha, beta, gamma, phi).
    pub fn free_params(&self) -> usize {
        1 + usize::from(self.has_trend())
            + usize::from(self.has_seasonal())
            + usize::from(self.is_damped())
    }
}

impl fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match self.trend {
            TrendKind::None => "none",
            TrendKind::Additive => "add",
        };
        let s = match self.seasonal {
            SeasonalKind::None => "none",
            SeasonalKind::Additive => "add",
            SeasonalKind::Multiplicative => "mul",
        };
        if self.is_damped() {
            write!(f, "({t},{s},damped)")
        } else {
            write!(f, "({t},{s})")
        }
    }
}

/// What a channel's active model actually is.
///
/// `Fallback` marks the naive seasonal-average baseline used when no
/// smoothing configuration converged, so consumers can surface the reduced
/// confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Fitted(ModelConfig),
    Fallback,
}

impl ModelChoice {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ModelChoice::Fallback)
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Fitted(config) => write!(f, "{config}"),
            ModelChoice::Fallback => write!(f, "fallback"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_space_has_nine_configs_with_multiplicative() {
        let all = ModelConfig::candidates(true);
        assert_eq!(all.len(), 9);

        // No damped config without a trend.
        assert!(all.iter().all(|c| !c.damped || c.has_trend()));

        // Insertion order starts with the simplest candidate.
        assert_eq!(all[0], ModelConfig::default());
    }

    #[test]
    fn candidate_space_drops_multiplicative_when_disallowed() {
        let restricted = ModelConfig::candidates(false);
        assert_eq!(restricted.len(), 6);
        assert!(restricted
            .iter()
            .all(|c| c.seasonal != SeasonalKind::Multiplicative));
    }

    #[test]
    fn free_params_counts_components() {
        assert_eq!(ModelConfig::default().free_params(), 1);
        assert_eq!(
            ModelConfig::new(TrendKind::Additive, SeasonalKind::None, false).free_params(),
            2
        );
        assert_eq!(
            ModelConfig::new(TrendKind::Additive, SeasonalKind::Additive, true).free_params(),
            4
        );
    }

    #[test]
    fn damped_flag_requires_trend() {
        let config = ModelConfig::new(TrendKind::None, SeasonalKind::Additive, true);
        assert!(!config.is_damped());
        assert_eq!(config.free_params(), 2);
    }

    #[test]
    fn display_forms() {
        let config = ModelConfig::new(TrendKind::Additive, SeasonalKind::Multiplicative, true);
        assert_eq!(config.to_string(), "(add,mul,damped)");
        assert_eq!(ModelConfig::default().to_string(), "(none,none)");
        assert_eq!(ModelChoice::Fallback.to_string(), "fallback");
        assert_eq!(ModelChoice::Fitted(config).to_string(), "(add,mul,damped)");
    }
}

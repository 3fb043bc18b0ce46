//! Tuning knobs for the Monte Carlo decision engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which policy drives every seat during a rollout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RolloutDriver {
    Heuristic,
    Softmax {
        #[serde(default = "default_temperature")]
        temperature: f64,
    },
}

impl Default for RolloutDriver {
    fn default() -> Self {
        Self::Heuristic
    }
}

/// What a finished rollout is worth to the deciding team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMeasure {
    /// Own tricks minus opponent tricks.
    #[default]
    Tricks,
    /// Signed round points.
    Points,
}

impl ValueMeasure {
    /// Best mean a call can reach when its rollouts are played with a partner.
    ///
    /// Tricks top out at a 5-0 march; points at the 2 a march scores.
    pub fn call_ceiling(self) -> f64 {
        match self {
            Self::Tricks => 5.0,
            Self::Points => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_sims must be at least 2 (got {0})")]
    MinSimsTooSmall(usize),
    #[error("max_sims ({max}) is below min_sims ({min})")]
    MaxBelowMin { min: usize, max: usize },
    #[error("{field} must be finite and non-negative (got {value})")]
    NotNonNegative { field: &'static str, value: f64 },
    #[error("alone_threshold {threshold} is out of reach under {measure:?} (calls score at most {ceiling})")]
    AloneThreshold {
        threshold: f64,
        measure: ValueMeasure,
        ceiling: f64,
    },
    #[error("softmax temperature must be positive (got {0})")]
    Temperature(f64),
    #[error("{key}: cannot parse {raw:?}")]
    Env { key: &'static str, raw: String },
}

/// Sampling budget, stop rule and bidding thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Samples every candidate receives before any can be retired.
    pub min_sims: usize,
    /// Hard cap on sampling passes per decision.
    pub max_sims: usize,
    pub stop_margin: f64,
    /// Confidence multiplier applied to standard errors.
    pub z: f64,
    /// Calling must beat passing by more than this.
    pub call_margin: f64,
    /// Mean value a call needs before it is made alone, on the scale of `value`.
    pub alone_threshold: f64,
    pub rollout_driver: RolloutDriver,
    pub value: ValueMeasure,
    pub seed: u64,
    /// Evaluate the candidates of each pass on the rayon pool.
    pub parallel: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            min_sims: 24,
            max_sims: 200,
            stop_margin: 0.05,
            z: 1.96,
            call_margin: 0.0,
            alone_threshold: 2.5,
            rollout_driver: RolloutDriver::Heuristic,
            value: ValueMeasure::Tricks,
            seed: 0x6575_6368_7265,
            parallel: false,
        }
    }
}

impl MonteCarloConfig {
    /// Small budget for tests and quick matches.
    pub fn fast() -> Self {
        Self {
            min_sims: 4,
            max_sims: 12,
            ..Self::default()
        }
    }

    pub fn with_sims(mut self, min_sims: usize, max_sims: usize) -> Self {
        self.min_sims = min_sims;
        self.max_sims = max_sims;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_rollout_driver(mut self, driver: RolloutDriver) -> Self {
        self.rollout_driver = driver;
        self
    }

    pub fn with_value(mut self, value: ValueMeasure) -> Self {
        self.value = value;
        self
    }

    pub fn with_alone_threshold(mut self, threshold: f64) -> Self {
        self.alone_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sims < 2 {
            return Err(ConfigError::MinSimsTooSmall(self.min_sims));
        }
        if self.max_sims < self.min_sims {
            return Err(ConfigError::MaxBelowMin {
                min: self.min_sims,
                max: self.max_sims,
            });
        }
        for (field, value) in [
            ("stop_margin", self.stop_margin),
            ("z", self.z),
            ("call_margin", self.call_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NotNonNegative { field, value });
            }
        }
        if !self.alone_threshold.is_finite() {
            return Err(ConfigError::NotNonNegative {
                field: "alone_threshold",
                value: self.alone_threshold,
            });
        }
        let ceiling = self.value.call_ceiling();
        if self.alone_threshold > ceiling {
            return Err(ConfigError::AloneThreshold {
                threshold: self.alone_threshold,
                measure: self.value,
                ceiling,
            });
        }
        if let RolloutDriver::Softmax { temperature } = self.rollout_driver {
            if !(temperature.is_finite() && temperature > 0.0) {
                return Err(ConfigError::Temperature(temperature));
            }
        }
        Ok(())
    }

    /// Defaults overridden by `EUCHRE_MC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, mut read: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_MIN_SIMS")? {
            self.min_sims = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_MAX_SIMS")? {
            self.max_sims = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_STOP_MARGIN")? {
            self.stop_margin = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_Z")? {
            self.z = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_CALL_MARGIN")? {
            self.call_margin = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_ALONE_THRESHOLD")? {
            self.alone_threshold = value;
        }
        if let Some(value) = parse_key(&mut read, "EUCHRE_MC_SEED")? {
            self.seed = value;
        }
        if let Some(raw) = read("EUCHRE_MC_PARALLEL") {
            self.parallel = matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON");
        }
        if let Some(raw) = read("EUCHRE_MC_DRIVER") {
            self.rollout_driver = match raw.trim().to_ascii_lowercase().as_str() {
                "heuristic" => RolloutDriver::Heuristic,
                "softmax" => RolloutDriver::Softmax {
                    temperature: default_temperature(),
                },
                _ => {
                    return Err(ConfigError::Env {
                        key: "EUCHRE_MC_DRIVER",
                        raw,
                    });
                }
            };
        }
        if let Some(temperature) = parse_key::<f64, _>(&mut read, "EUCHRE_MC_TEMPERATURE")? {
            if let RolloutDriver::Softmax { .. } = self.rollout_driver {
                self.rollout_driver = RolloutDriver::Softmax { temperature };
            }
        }
        if let Some(raw) = read("EUCHRE_MC_VALUE") {
            self.value = match raw.trim().to_ascii_lowercase().as_str() {
                "tricks" => ValueMeasure::Tricks,
                "points" => ValueMeasure::Points,
                _ => {
                    return Err(ConfigError::Env {
                        key: "EUCHRE_MC_VALUE",
                        raw,
                    });
                }
            };
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_key<T, F>(read: &mut F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: FnMut(&str) -> Option<String>,
{
    match read(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, raw }),
        None => Ok(None),
    }
}

pub(crate) fn default_temperature() -> f64 {
    0.35
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MonteCarloConfig, RolloutDriver, ValueMeasure};
    use std::collections::HashMap;

    fn reader(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        let config = MonteCarloConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.alone_threshold, 2.5);
        assert_eq!(config.call_margin, 0.0);
        assert!(MonteCarloConfig::fast().validate().is_ok());
    }

    #[test]
    fn rejects_tiny_budget() {
        let config = MonteCarloConfig::default().with_sims(1, 10);
        assert_eq!(config.validate(), Err(ConfigError::MinSimsTooSmall(1)));
        let config = MonteCarloConfig::default().with_sims(10, 5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxBelowMin { .. })
        ));
    }

    #[test]
    fn alone_threshold_must_fit_the_value_scale() {
        let config = MonteCarloConfig::default().with_value(ValueMeasure::Points);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AloneThreshold {
                threshold: 2.5,
                measure: ValueMeasure::Points,
                ceiling: 2.0,
            })
        );
        let config = config.with_alone_threshold(1.5);
        assert!(config.validate().is_ok());
        let config = MonteCarloConfig::default().with_alone_threshold(5.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AloneThreshold { ceiling, .. }) if ceiling == 5.0
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let config = MonteCarloConfig::default()
            .apply_overrides(reader(&[
                ("EUCHRE_MC_MIN_SIMS", "8"),
                ("EUCHRE_MC_MAX_SIMS", "40"),
                ("EUCHRE_MC_PARALLEL", "on"),
                ("EUCHRE_MC_DRIVER", "softmax"),
                ("EUCHRE_MC_TEMPERATURE", "0.5"),
                ("EUCHRE_MC_VALUE", "points"),
            ]))
            .unwrap();
        assert_eq!(config.min_sims, 8);
        assert_eq!(config.max_sims, 40);
        assert!(config.parallel);
        assert_eq!(
            config.rollout_driver,
            RolloutDriver::Softmax { temperature: 0.5 }
        );
        assert_eq!(config.value, ValueMeasure::Points);
    }

    #[test]
    fn bad_env_value_is_reported() {
        let err = MonteCarloConfig::default()
            .apply_overrides(reader(&[("EUCHRE_MC_Z", "wide")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "EUCHRE_MC_Z", .. }));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: MonteCarloConfig =
            serde_json::from_str(r#"{"max_sims": 64, "rollout_driver": {"kind": "softmax"}}"#)
                .unwrap();
        assert_eq!(config.max_sims, 64);
        assert_eq!(config.min_sims, 24);
        assert_eq!(
            config.rollout_driver,
            RolloutDriver::Softmax { temperature: 0.35 }
        );
    }
}

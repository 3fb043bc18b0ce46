use euchre_bot::config::MonteCarloConfig;
use euchre_bot::policy::PolicyKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_WINNING_SCORE: u32 = 10;
const DEFAULT_SOFTMAX_TEMPERATURE: f64 = 0.35;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub matches: MatchConfig,
    pub teams: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.matches.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_teams(&mut self.teams)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// How many games to play and under which rules.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub games: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_winning_score")]
    pub winning_score: u32,
    /// Alternate which partnership each team occupies from game to game.
    #[serde(default = "default_swap_seats")]
    pub swap_seats: bool,
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.games == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.games".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }

        if self.winning_score == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.winning_score".to_string(),
                message: "winning score must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_winning_score() -> u32 {
    DEFAULT_WINNING_SCORE
}

fn default_swap_seats() -> bool {
    true
}

/// One partnership's agent. Both seats of the team run the same policy kind.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

impl AgentConfig {
    /// Turns `kind` plus `params` into the bot's policy description.
    ///
    /// Monte Carlo agents take their parameters as a [`MonteCarloConfig`] and then
    /// apply any `EUCHRE_MC_*` environment overrides.
    pub fn policy_kind(&self) -> Result<PolicyKind, ValidationError> {
        match self.kind {
            AgentKind::Heuristic => Ok(PolicyKind::Heuristic),
            AgentKind::Softmax => {
                let params: SoftmaxParams = serde_yaml::from_value(self.params.clone())
                    .map_err(|err| self.invalid_params(err.to_string()))?;
                if !(params.temperature > 0.0 && params.temperature.is_finite()) {
                    return Err(self.invalid_params(format!(
                        "temperature must be positive, got {}",
                        params.temperature
                    )));
                }
                Ok(PolicyKind::Softmax {
                    temperature: params.temperature,
                })
            }
            AgentKind::MonteCarlo => {
                let config: MonteCarloConfig = serde_yaml::from_value(self.params.clone())
                    .map_err(|err| self.invalid_params(err.to_string()))?;
                let config = config
                    .with_env_overrides()
                    .map_err(|err| self.invalid_params(err.to_string()))?;
                config
                    .validate()
                    .map_err(|err| self.invalid_params(err.to_string()))?;
                Ok(PolicyKind::MonteCarlo {
                    config: Box::new(config),
                })
            }
        }
    }

    fn invalid_params(&self, message: String) -> ValidationError {
        ValidationError::InvalidField {
            field: format!("teams[{}].params", self.name),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Heuristic,
    Softmax,
    MonteCarlo,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SoftmaxParams {
    #[serde(default = "default_softmax_temperature")]
    temperature: f64,
}

fn default_softmax_temperature() -> f64 {
    DEFAULT_SOFTMAX_TEMPERATURE
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_teams(teams: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if teams.len() != 2 {
        return Err(ValidationError::InvalidField {
            field: "teams".to_string(),
            message: format!("exactly two teams are required, found {}", teams.len()),
        });
    }

    for team in teams.iter_mut() {
        if team.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "teams.name".to_string(),
                message: "team name must not be empty".to_string(),
            });
        }

        if !team.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("teams[{}].name", team.name),
                message: "team name contains invalid characters".to_string(),
            });
        }

        if team.params.is_null() {
            team.params = serde_yaml::Value::Mapping(Default::default());
        }
        team.policy_kind()?;
    }

    if teams[0].name == teams[1].name {
        return Err(ValidationError::InvalidField {
            field: "teams".to_string(),
            message: format!("team name '{}' defined more than once", teams[0].name),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

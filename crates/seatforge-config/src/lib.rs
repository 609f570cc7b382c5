//! Configuration system for Seatforge.
//!
//! Load placement configuration from TOML or YAML files to control
//! termination, retries, heuristic weights and randomness without code
//! changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use seatforge_config::PlacementConfig;
//! use std::time::Duration;
//!
//! let config = PlacementConfig::from_toml_str(r#"
//!     random_seed = 42
//!
//!     [termination]
//!     time_limit_ms = 5000
//!
//!     [retry]
//!     enabled = true
//!     max_retries = 5
//!
//!     [randomness]
//!     preset = "creative"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_millis(5000)));
//! assert!(config.retry.enabled);
//! ```
//!
//! Use default config when the file is missing:
//!
//! ```
//! use seatforge_config::PlacementConfig;
//!
//! let config = PlacementConfig::load("placement.toml").unwrap_or_default();
//! // Proceeds with defaults if the file doesn't exist
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main placement configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PlacementConfig {
    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Termination configuration.
    #[serde(default)]
    pub termination: TerminationConfig,

    /// Retry orchestration configuration.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Variable-selection weights for the heuristic-propagation engine.
    #[serde(default)]
    pub weights: HeuristicWeights,

    /// Randomness parameters for the adaptive-random engine.
    #[serde(default)]
    pub randomness: RandomnessConfig,
}

impl PlacementConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validated()
    }

    /// Checks value ranges the types cannot express.
    fn validated(self) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("randomness", self.randomness.randomness),
            (
                "exploration_probability",
                self.randomness.exploration_probability,
            ),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(ConfigError::Invalid(format!(
                        "{name} must lie within 0.0..=1.0, got {v}"
                    )));
                }
            }
        }
        let w = &self.weights;
        if [w.mrv, w.degree, w.criticality, w.flexibility]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(ConfigError::Invalid(
                "heuristic weights must not be negative".to_string(),
            ));
        }
        Ok(self)
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.termination.time_limit_ms = Some(ms);
        self
    }

    /// Enables retry with the given attempt cap.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryConfig {
            enabled: true,
            max_retries,
        };
        self
    }

    /// Applies a randomness preset.
    pub fn with_preset(mut self, preset: RandomnessPreset) -> Self {
        self.randomness = RandomnessConfig::from_preset(preset);
        self
    }

    /// Returns the wall-clock time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.time_limit_ms.map(Duration::from_millis)
    }
}

/// Termination configuration shared by all engines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct TerminationConfig {
    /// Maximum milliseconds to spend on one placement invocation,
    /// shared across all of its attempts.
    pub time_limit_ms: Option<u64>,

    /// Maximum recursion depth for the backtracking engines.
    pub max_depth: usize,

    /// Maximum random-restart attempts within one engine run.
    pub max_attempts: u32,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(10_000),
            max_depth: 10_000,
            max_attempts: 5,
        }
    }
}

/// Retry orchestration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct RetryConfig {
    /// Whether the orchestrator may re-run the engine.
    pub enabled: bool,

    /// Maximum number of orchestrated attempts.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: 3,
        }
    }
}

/// Variable-selection weights for the heuristic-propagation engine.
///
/// The four scores are combined as a weighted sum; the defaults favour
/// most-constrained-first ordering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct HeuristicWeights {
    pub mrv: f64,
    pub degree: f64,
    pub criticality: f64,
    pub flexibility: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            mrv: 0.35,
            degree: 0.35,
            criticality: 0.20,
            flexibility: 0.10,
        }
    }
}

/// Seat-selection strategy of the adaptive-random engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Always take the safest seat (highest constraint score).
    Conservative,

    /// Weighted random pick over the top half.
    #[default]
    Balanced,

    /// Random pick over the top 70%, ranked by score plus diversity.
    Exploratory,

    /// Uniform random among all constraint-valid candidates.
    Chaos,
}

/// Named presets fixing the adaptive-random mode and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomnessPreset {
    Subtle,
    Balanced,
    Creative,
    Wild,
}

/// Randomness parameters for the adaptive-random engine.
///
/// A preset fixes the mode and parameters; every individual field may still
/// be overridden. Call [`RandomnessConfig::resolved`] to obtain the
/// concrete values an engine should run with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RandomnessConfig {
    /// Base preset; defaults to `balanced` when neither a preset nor
    /// overrides are given.
    #[serde(default)]
    pub preset: Option<RandomnessPreset>,

    /// Seat-selection strategy override.
    #[serde(default)]
    pub mode: Option<SelectionMode>,

    /// Overall randomness budget override, in `0.0..=1.0`.
    #[serde(default)]
    pub randomness: Option<f64>,

    /// Override for the probability of exploratory (rather than
    /// exploitative) student picks.
    #[serde(default)]
    pub exploration_probability: Option<f64>,

    /// Number of independent candidate runs to generate and compare.
    #[serde(default)]
    pub candidates: Option<u32>,
}

impl RandomnessConfig {
    /// Starts from a preset with no overrides.
    pub fn from_preset(preset: RandomnessPreset) -> Self {
        Self {
            preset: Some(preset),
            ..Self::default()
        }
    }

    /// Resolves preset plus overrides into concrete parameters.
    pub fn resolved(&self) -> ResolvedRandomness {
        let preset = self.preset.unwrap_or(RandomnessPreset::Balanced);
        let (mode, randomness, exploration_probability) = match preset {
            RandomnessPreset::Subtle => (SelectionMode::Conservative, 0.2, 0.2),
            RandomnessPreset::Balanced => (SelectionMode::Balanced, 0.5, 0.5),
            RandomnessPreset::Creative => (SelectionMode::Exploratory, 0.7, 0.7),
            RandomnessPreset::Wild => (SelectionMode::Chaos, 0.95, 0.9),
        };
        ResolvedRandomness {
            mode: self.mode.unwrap_or(mode),
            randomness: self.randomness.unwrap_or(randomness),
            exploration_probability: self
                .exploration_probability
                .unwrap_or(exploration_probability),
            candidates: self.candidates.unwrap_or(3).max(1),
        }
    }
}

/// Concrete adaptive-random parameters after preset resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRandomness {
    pub mode: SelectionMode,
    pub randomness: f64,
    pub exploration_probability: f64,
    pub candidates: u32,
}

//! Serializable backtest configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use synergylab_core::{CapitalPolicy, KellySizer, SynergyMap};

/// Content-addressable identifier of a configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration for a single backtest run.
///
/// Constructed by the caller, read-only during the run and echoed unchanged
/// into the result. Every field has a default, so an empty TOML document is
/// a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacktestConfig {
    /// Equity-curve seed and return denominator.
    pub initial_capital: f64,

    /// Re-size trades with the fractional Kelly sizer.
    pub use_kelly: bool,

    /// Kelly damping scale in (0, 1].
    pub kelly_fraction: f64,

    /// Score every signal row and attach the scores to the result.
    pub synergy_enabled: bool,

    /// Append generated commentary to each trade.
    pub commentary: bool,

    /// Weighted column override for the synergy scorer.
    pub synergy_map: Option<SynergyMap>,

    /// Whether Kelly sizing compounds realized profit into capital.
    pub capital_policy: CapitalPolicy,

    /// Dollars gained per dollar risked on a win.
    pub win_multiple: f64,

    /// Dollars lost per dollar risked on a loss.
    pub lose_multiple: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            use_kelly: false,
            kelly_fraction: 0.5,
            synergy_enabled: false,
            commentary: false,
            synergy_map: None,
            capital_policy: CapitalPolicy::Fixed,
            win_multiple: 2.0,
            lose_multiple: 1.0,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be a positive number, got {}",
                self.initial_capital
            )));
        }
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "kelly_fraction must be in (0, 1], got {}",
                self.kelly_fraction
            )));
        }
        for (name, value) in [
            ("win_multiple", self.win_multiple),
            ("lose_multiple", self.lose_multiple),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(map) = &self.synergy_map {
            if let Some((column, weight)) = map.iter().find(|(_, w)| !w.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "synergy weight for '{column}' is not finite ({weight})"
                )));
            }
        }
        Ok(())
    }

    /// Kelly sizer described by this configuration.
    pub fn kelly_sizer(&self) -> KellySizer {
        KellySizer::new(self.win_multiple, self.lose_multiple, self.kelly_fraction)
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

//! Application configuration loaded from TOML.
//!
//! ```toml
//! data_dir = "datos"
//! output_dir = "reports"
//! assets = ["BTC", "ETH", "SOL"]
//!
//! [backtest]
//! initial_capital = 10000.0
//! strategy = "rsi_macd"
//!
//! [indicators]
//! rsi_period = 14
//!
//! [decision]
//! buy_above = 0.1
//! ```
//!
//! Every table is optional; omitted keys keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use coinlens_core::analysis::{AnalysisConfig, DecisionConfig};
use coinlens_core::backtest::{Strategy, DEFAULT_INITIAL_CAPITAL};
use coinlens_core::indicators::IndicatorParams;

pub const DEFAULT_DATA_DIR: &str = "datos";
pub const DEFAULT_OUTPUT_DIR: &str = "reports";
pub const DEFAULT_ASSETS: [&str; 8] = ["ADA", "BNB", "BTC", "DOGE", "DOT", "ETH", "SOL", "XRP"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    pub strategy: Strategy,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            strategy: Strategy::RsiMacd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// One `<ASSET>.csv` history file per asset.
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Assets analysed when none are named on the command line.
    pub assets: Vec<String>,
    pub backtest: BacktestSettings,
    pub indicators: IndicatorParams,
    pub decision: DecisionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            backtest: BacktestSettings::default(),
            indicators: IndicatorParams::default(),
            decision: DecisionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backtest.initial_capital.is_finite() && self.backtest.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_capital must be positive, got {}",
                self.backtest.initial_capital
            )));
        }
        let p = &self.indicators;
        if p.rsi_period == 0 || p.macd_fast == 0 || p.macd_slow == 0 || p.macd_signal == 0 {
            return Err(ConfigError::Invalid("indicator periods must be at least 1".into()));
        }
        if p.bollinger_period < 2 {
            return Err(ConfigError::Invalid(
                "indicators.bollinger_period must be at least 2".into(),
            ));
        }
        Ok(())
    }

    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            indicators: self.indicators,
            decision: self.decision.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = AppConfig::from_toml(
            r#"
            data_dir = "/tmp/prices"
            assets = ["BTC", "ETH"]

            [backtest]
            strategy = "golden_cross"

            [indicators]
            rsi_period = 21
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(config.assets, vec!["BTC", "ETH"]);
        assert_eq!(config.backtest.strategy, Strategy::GoldenCross);
        assert_eq!(config.backtest.initial_capital, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(config.indicators.rsi_period, 21);
        assert_eq!(config.indicators.macd_slow, 26);
    }

    #[test]
    fn toml_roundtrip() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = AppConfig::from_toml("[backtest]\nstrategy = \"martingale\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_non_positive_capital() {
        let err = AppConfig::from_toml("[backtest]\ninitial_capital = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}

//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so a partial file (or none at all) is valid:
//!
//! ```toml
//! [sizing]
//! fee_rate = 0.0005
//! margin_warning_percent = 25.0
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

/// Indicator periods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub volatility_period: usize,
    pub ma_short: usize,
    pub ma_long: usize,
    pub ema_fast: usize,
    pub ema_trend: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trailing MACD-line points used to derive the signal line
    pub macd_lookback: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            volatility_period: 14,
            ma_short: 50,
            ma_long: 200,
            ema_fast: 12,
            ema_trend: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            macd_lookback: 50,
        }
    }
}

/// Position sizing constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SizingConfig {
    /// Round-trip maker + taker fee as a fraction of notional
    pub fee_rate: f64,
    /// Margin usage above this is advisory
    pub margin_warning_percent: f64,
    /// Margin usage above this is blocked
    pub margin_limit_percent: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.0007,
            margin_warning_percent: 30.0,
            margin_limit_percent: 100.0,
        }
    }
}

/// Strategy rule thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleConfig {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub sizing: SizingConfig,
    pub rules: RuleConfig,
}

impl EngineConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.tradegate/config.toml`
    /// Can be overridden with `TRADEGATE_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("TRADEGATE_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".tradegate/config.toml"))
            .unwrap_or_else(|| PathBuf::from("tradegate.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.indicators.macd_lookback, 50);
        assert_eq!(config.sizing.fee_rate, 0.0007);
        assert_eq!(config.sizing.margin_limit_percent, 100.0);
        assert_eq!(config.rules.rsi_oversold, 30.0);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml(
            r#"
            [sizing]
            fee_rate = 0.0005

            [rules]
            rsi_overbought = 75.0
            "#,
        )
        .unwrap();

        assert_eq!(config.sizing.fee_rate, 0.0005);
        assert_eq!(config.sizing.margin_warning_percent, 30.0);
        assert_eq!(config.rules.rsi_overbought, 75.0);
        assert_eq!(config.rules.rsi_oversold, 30.0);
        assert_eq!(config.indicators, IndicatorConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_toml("[sizing]\nfee_rate = \"cheap\"");
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[indicators]\nrsi_period = 21\n").unwrap();

        let config = EngineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.indicators.rsi_period, 21);
    }
}

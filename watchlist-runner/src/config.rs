//! Watchlist configuration.
//!
//! Loaded from a TOML file; every section and field has a default, so an empty
//! file is a valid config:
//!
//! ```toml
//! tickers = ["QBTS", "RGTI", "IONQ"]
//! period = "1d"
//! interval = "5m"
//!
//! [signals]
//! sma_fast = 50
//! sma_slow = 200
//!
//! [fusion]
//! technical_weight = 0.6
//! sentiment_weight = 0.4
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use watchlist_core::backtest::BacktestConfig;
use watchlist_core::indicators::IndicatorConfig;
use watchlist_core::levels::LevelConfig;
use watchlist_core::signals::SignalConfig;

use crate::fusion::FusionConfig;
use crate::provider::is_valid_ticker;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub tickers: Vec<String>,
    /// Lookback window passed to the price provider (e.g. "1d", "5d", "1mo").
    pub period: String,
    /// Bar interval (e.g. "5m", "1h", "1d").
    pub interval: String,
    pub indicators: IndicatorConfig,
    pub signals: SignalConfig,
    pub levels: LevelConfig,
    pub backtest: BacktestConfig,
    pub risk: RiskConfig,
    pub fusion: FusionConfig,
    pub cache: CacheConfig,
    pub sentiment: SentimentConfig,
    pub provider: ProviderConfig,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            tickers: vec!["QBTS".into(), "RGTI".into(), "IONQ".into()],
            period: "1d".into(),
            interval: "5m".into(),
            indicators: IndicatorConfig::default(),
            signals: SignalConfig::default(),
            levels: LevelConfig::default(),
            backtest: BacktestConfig::default(),
            risk: RiskConfig::default(),
            fusion: FusionConfig::default(),
            cache: CacheConfig::default(),
            sentiment: SentimentConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub account_size: f64,
    /// Percent of the account risked per trade.
    pub risk_pct: f64,
    /// Stop distance below entry when no support level sits under the price.
    pub default_stop_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            risk_pct: 1.0,
            default_stop_pct: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub price_ttl_secs: u64,
    pub news_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            price_ttl_secs: 60,
            news_ttl_secs: 900,
        }
    }
}

impl CacheConfig {
    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    /// Headlines older than this many days are ignored.
    pub news_lookback_days: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            news_lookback_days: 3,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WatchlistConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.tickers.is_empty() {
            return invalid("tickers must not be empty".into());
        }
        if let Some(t) = self.tickers.iter().find(|t| !is_valid_ticker(t)) {
            return invalid(format!("ticker {t:?} is not a valid symbol"));
        }
        if self.period.trim().is_empty() || self.interval.trim().is_empty() {
            return invalid("period and interval must be set".into());
        }

        let ind = &self.indicators;
        if ind.sma_windows.contains(&0) {
            return invalid("sma_windows must be positive".into());
        }
        for (name, value) in [
            ("rsi_period", ind.rsi_period),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("bollinger_period", ind.bollinger_period),
            ("levels.window", self.levels.window),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        if ind.macd_fast >= ind.macd_slow {
            return invalid(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            ));
        }
        if !(ind.bollinger_k > 0.0) {
            return invalid("bollinger_k must be positive".into());
        }

        let sig = &self.signals;
        if sig.sma_fast == 0 || sig.sma_fast >= sig.sma_slow {
            return invalid(format!(
                "sma_fast ({}) must be positive and below sma_slow ({})",
                sig.sma_fast, sig.sma_slow
            ));
        }
        if !(0.0..=100.0).contains(&sig.rsi_oversold)
            || !(0.0..=100.0).contains(&sig.rsi_overbought)
            || sig.rsi_oversold >= sig.rsi_overbought
        {
            return invalid("rsi bounds must satisfy 0 <= oversold < overbought <= 100".into());
        }
        for (name, value) in [
            ("signals.action_threshold", sig.action_threshold),
            ("fusion.threshold", self.fusion.threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {value}"));
            }
        }
        if !(self.levels.threshold >= 0.0) {
            return invalid("levels.threshold must be non-negative".into());
        }

        if !(self.backtest.initial_capital > 0.0) {
            return invalid("backtest.initial_capital must be positive".into());
        }

        let risk = &self.risk;
        if !(risk.account_size > 0.0) {
            return invalid("risk.account_size must be positive".into());
        }
        if !(risk.risk_pct > 0.0 && risk.risk_pct <= 100.0) {
            return invalid("risk.risk_pct must be in (0, 100]".into());
        }
        if !(risk.default_stop_pct > 0.0 && risk.default_stop_pct < 1.0) {
            return invalid("risk.default_stop_pct must be in (0, 1)".into());
        }

        let fusion = &self.fusion;
        if !(fusion.technical_weight >= 0.0 && fusion.sentiment_weight >= 0.0) {
            return invalid("fusion weights must be non-negative".into());
        }
        if fusion.technical_weight + fusion.sentiment_weight == 0.0 {
            return invalid("fusion weights must not both be zero".into());
        }

        if self.provider.timeout_secs == 0 || self.sentiment.timeout_secs == 0 {
            return invalid("timeouts must be positive".into());
        }
        if self.provider.news_lookback_days == 0 {
            return invalid("provider.news_lookback_days must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = WatchlistConfig::from_toml("").unwrap();
        assert_eq!(config, WatchlistConfig::default());
        assert_eq!(config.tickers, vec!["QBTS", "RGTI", "IONQ"]);
        assert_eq!(config.period, "1d");
        assert_eq!(config.interval, "5m");
        assert_eq!(config.sentiment.model, "gpt-3.5-turbo");
        assert_eq!(config.sentiment.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = WatchlistConfig::from_toml(
            r#"
            tickers = ["AAPL"]
            interval = "15m"

            [signals]
            sma_fast = 10
            sma_slow = 30
            bollinger = false

            [fusion]
            threshold = 0.3

            [cache]
            price_ttl_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.tickers, vec!["AAPL"]);
        assert_eq!(config.interval, "15m");
        assert_eq!(config.period, "1d");
        assert_eq!(config.signals.sma_fast, 10);
        assert!(!config.signals.bollinger);
        assert!(config.signals.rsi);
        assert_eq!(config.fusion.threshold, 0.3);
        assert_eq!(config.fusion.technical_weight, 0.6);
        assert_eq!(config.cache.price_ttl(), Duration::from_secs(5));
        assert_eq!(config.cache.news_ttl_secs, 900);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = WatchlistConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(WatchlistConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_nonsense() {
        let cases = [
            "tickers = []",
            "[signals]\nsma_fast = 200\nsma_slow = 50",
            "[indicators]\nrsi_period = 0",
            "[indicators]\nmacd_fast = 26\nmacd_slow = 12",
            "[signals]\naction_threshold = 0.0",
            "[fusion]\nthreshold = 1.5",
            "[fusion]\nsentiment_weight = -0.1",
            "[fusion]\ntechnical_weight = 0.0\nsentiment_weight = 0.0",
            "[risk]\ndefault_stop_pct = 1.0",
            "[levels]\nwindow = 0",
            r#"tickers = ["../etc/passwd"]"#,
            r#"tickers = ["IONQ", "a/b"]"#,
            r#"tickers = [" "]"#,
        ];
        for toml in cases {
            assert!(
                matches!(WatchlistConfig::from_toml(toml), Err(ConfigError::Invalid(_))),
                "accepted: {toml}"
            );
        }
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(
            WatchlistConfig::from_toml("tickers = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = WatchlistConfig::from_file(Path::new("/nonexistent/watchlist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

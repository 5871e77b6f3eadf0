// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{PredictorError, Result};
use crate::models::{BackpropMode, Config};

/// Where the binary gets its candles from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Binance,
    Synthetic,
}

impl FromStr for DataSource {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binance" => Ok(DataSource::Binance),
            "synthetic" => Ok(DataSource::Synthetic),
            other => Err(PredictorError::InvalidConfig(format!(
                "unknown data source '{}'",
                other
            ))),
        }
    }
}

impl FromStr for BackpropMode {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(BackpropMode::Simple),
            "verbose" => Ok(BackpropMode::Verbose),
            other => Err(PredictorError::InvalidConfig(format!(
                "unknown backprop mode '{}'",
                other
            ))),
        }
    }
}

/// Process-level settings for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: Config,
    pub symbol: String,
    pub interval: String,
    pub history_limit: usize,
    pub data_source: DataSource,
    pub api_base_url: String,
    /// Seconds between polls of the latest candle; 0 disables polling
    pub poll_interval_secs: u64,
    pub model_path: PathBuf,
    pub loss_plot_path: Option<PathBuf>,
    pub bind_addr: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            model: Config::default(),
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            history_limit: 100,
            data_source: DataSource::Binance,
            api_base_url: "https://api.binance.com".to_string(),
            poll_interval_secs: 60,
            model_path: PathBuf::from("model_state.json"),
            loss_plot_path: None,
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and reads settings from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, then validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let config = AppConfig {
            model: Config {
                learning_rate: parse_or(&lookup, "LEARNING_RATE", defaults.model.learning_rate)?,
                epochs: parse_or(&lookup, "EPOCHS", defaults.model.epochs)?,
                backprop_mode: parse_or(&lookup, "BACKPROP_MODE", defaults.model.backprop_mode)?,
            },
            symbol: lookup("SYMBOL").unwrap_or(defaults.symbol),
            interval: lookup("INTERVAL").unwrap_or(defaults.interval),
            history_limit: parse_or(&lookup, "HISTORY_LIMIT", defaults.history_limit)?,
            data_source: parse_or(&lookup, "DATA_SOURCE", defaults.data_source)?,
            api_base_url: lookup("API_BASE_URL").unwrap_or(defaults.api_base_url),
            poll_interval_secs: parse_or(&lookup, "POLL_INTERVAL_SECS", defaults.poll_interval_secs)?,
            model_path: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            loss_plot_path: lookup("LOSS_PLOT_PATH").map(PathBuf::from),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_or(&lookup, "PORT", defaults.port)?,
        };
        config.model.validate()?;
        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PredictorError::InvalidConfig(format!("{}: cannot parse '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model, Config::default());
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.data_source, DataSource::Binance);
        assert_eq!(config.port, 8080);
        assert!(config.loss_plot_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEARNING_RATE", "0.25"),
            ("EPOCHS", "50"),
            ("BACKPROP_MODE", "Verbose"),
            ("DATA_SOURCE", "synthetic"),
            ("POLL_INTERVAL_SECS", "0"),
            ("LOSS_PLOT_PATH", "loss.svg"),
        ]))
        .unwrap();
        assert_eq!(config.model, Config::new(0.25, 50, BackpropMode::Verbose));
        assert_eq!(config.data_source, DataSource::Synthetic);
        assert_eq!(config.poll_interval_secs, 0);
        assert_eq!(config.loss_plot_path, Some(PathBuf::from("loss.svg")));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        for pairs in [
            [("LEARNING_RATE", "0")],
            [("LEARNING_RATE", "1.01")],
            [("EPOCHS", "0")],
            [("EPOCHS", "20000")],
        ] {
            assert!(matches!(
                AppConfig::from_lookup(lookup_from(&pairs)),
                Err(PredictorError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        for pairs in [
            [("EPOCHS", "lots")],
            [("BACKPROP_MODE", "adam")],
            [("DATA_SOURCE", "kraken")],
            [("PORT", "-1")],
        ] {
            assert!(matches!(
                AppConfig::from_lookup(lookup_from(&pairs)),
                Err(PredictorError::InvalidConfig(_))
            ));
        }
    }
}

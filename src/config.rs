use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub order: String,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Sent as `x-cg-demo-api-key` when set.
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3/coins/markets".to_string(),
            vs_currency: "usd".to_string(),
            order: "market_cap_desc".to_string(),
            per_page: 100,
            page: 1,
            sparkline: false,
            timeout_seconds: 10,
            user_agent: "coin-screener/0.1".to_string(),
            api_key: None,
        }
    }
}

/// Filter thresholds and indicator windows handed to the analyzer on every call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 24h change (%) a coin must exceed.
    pub threshold: f64,
    /// 24h volume a coin must exceed.
    pub min_volume: f64,
    pub sma_window: usize,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub bollinger_window: usize,
    pub bollinger_dev: f64,
    /// When false the sidebar inputs are shown but the thresholds above are used.
    pub use_sidebar_filters: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            min_volume: 1_000_000.0,
            sma_window: 2,
            rsi_window: 2,
            macd_fast: 12,
            macd_slow: 26,
            bollinger_window: 2,
            bollinger_dev: 2.0,
            use_sidebar_filters: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8501".to_string(),
            title: "Cryptocurrencies with growth potential".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.sma_window == 0 || a.rsi_window == 0 || a.bollinger_window == 0 {
            return Err(ConfigError::Invalid("indicator windows must be at least 1".into()));
        }
        if a.macd_fast == 0 || a.macd_fast >= a.macd_slow {
            return Err(ConfigError::Invalid(format!(
                "macd_fast ({}) must be positive and below macd_slow ({})",
                a.macd_fast, a.macd_slow
            )));
        }
        if !a.threshold.is_finite() || !a.min_volume.is_finite() {
            return Err(ConfigError::Invalid("thresholds must be finite".into()));
        }
        if self.api.per_page == 0 || self.api.page == 0 {
            return Err(ConfigError::Invalid("per_page and page start at 1".into()));
        }
        Ok(())
    }
}

/// Loads the config file; a missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

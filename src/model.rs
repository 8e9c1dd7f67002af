// Core structs: MarketRecord, AnalysisResult, SkipReason
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One coin as returned by the `/coins/markets` endpoint.
/// Upstream sends `null` for numbers it has no data for, so every value is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub current_price: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl MarketRecord {
    /// Short label for log lines.
    pub fn label(&self) -> &str {
        self.symbol
            .as_deref()
            .or(self.id.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub volume: f64,
    pub sma: f64,
    pub rsi: f64,
    /// `None` until the slow EMA window has enough history.
    pub macd: Option<f64>,
    pub bollinger_mavg: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
}

/// Why a record produced no `AnalysisResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MissingField(&'static str),
    BelowThreshold,
    BelowVolume,
    NonFinite(&'static str),
    /// The upstream element could not be decoded as a market record.
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing field `{}`", field),
            SkipReason::BelowThreshold => write!(f, "24h change not above threshold"),
            SkipReason::BelowVolume => write!(f, "volume not above floor"),
            SkipReason::NonFinite(indicator) => write!(f, "{} is not finite", indicator),
            SkipReason::Malformed => write!(f, "malformed upstream element"),
        }
    }
}

pub type RecordOutcome = Result<AnalysisResult, SkipReason>;

/// An element of the upstream array that did not decode.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub label: String,
    pub error: String,
}

/// One element of the upstream array, decoded on its own.
pub type FetchedRecord = Result<MarketRecord, MalformedRecord>;

/// Banner shown above the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Error(String),
    Warning(String),
    Status(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream responded with status {0}")]
    Status(u16),

    #[error("could not decode market data: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

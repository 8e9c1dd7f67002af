use crate::analyzer::{Analyzer, SkippedRecord};
use crate::config::AnalysisConfig;
use crate::fetcher::MarketSource;
use crate::model::{AnalysisResult, Notice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const THRESHOLD_MIN: f64 = 1.0;
pub const THRESHOLD_MAX: f64 = 20.0;
pub const VOLUME_STEP: f64 = 100_000.0;

/// Raw sidebar values as they arrive in the query string. Kept as text so an
/// empty form field reads as "not given" instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SidebarParams {
    pub threshold: Option<String>,
    pub min_volume: Option<String>,
}

fn parse_number(raw: Option<&str>, message: &str) -> Result<Option<f64>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| message.to_string()),
    }
}

/// Validated sidebar values for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SidebarInputs {
    pub threshold: f64,
    pub min_volume: f64,
}

impl SidebarInputs {
    /// Fills gaps from `defaults` and clamps the threshold to the slider range.
    pub fn from_params(params: &SidebarParams, defaults: &AnalysisConfig) -> Result<Self, String> {
        const BAD_THRESHOLD: &str = "threshold must be a number";
        const BAD_VOLUME: &str = "min_volume must be a non-negative number";

        let threshold = parse_number(params.threshold.as_deref(), BAD_THRESHOLD)?
            .unwrap_or(defaults.threshold);
        if !threshold.is_finite() {
            return Err(BAD_THRESHOLD.into());
        }
        let min_volume = parse_number(params.min_volume.as_deref(), BAD_VOLUME)?
            .unwrap_or(defaults.min_volume);
        if !min_volume.is_finite() || min_volume < 0.0 {
            return Err(BAD_VOLUME.into());
        }
        Ok(Self {
            threshold: threshold.clamp(THRESHOLD_MIN, THRESHOLD_MAX),
            min_volume,
        })
    }
}

/// Everything the presenter needs for one page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub inputs: SidebarInputs,
    /// Whether `inputs` were used for filtering.
    pub inputs_applied: bool,
    pub notices: Vec<Notice>,
    pub results: Vec<AnalysisResult>,
    pub fetched: usize,
    pub skipped: Vec<SkippedRecord>,
    pub generated_at: DateTime<Utc>,
}

/// Runs fetch, analyze and collects the view for one request.
pub async fn run_dashboard(
    source: &dyn MarketSource,
    analyzer: &dyn Analyzer,
    cfg: &AnalysisConfig,
    inputs: SidebarInputs,
) -> DashboardView {
    info!(
        "Sidebar inputs: threshold = {}, min_volume = {}",
        inputs.threshold, inputs.min_volume
    );

    let effective = if cfg.use_sidebar_filters {
        AnalysisConfig {
            threshold: inputs.threshold,
            min_volume: inputs.min_volume,
            ..cfg.clone()
        }
    } else {
        cfg.clone()
    };

    let mut view = DashboardView {
        inputs,
        inputs_applied: cfg.use_sidebar_filters,
        notices: Vec::new(),
        results: Vec::new(),
        fetched: 0,
        skipped: Vec::new(),
        generated_at: Utc::now(),
    };

    let records = match source.fetch().await {
        Ok(records) => records,
        Err(e) => {
            error!("Fetch from {} failed: {}", source.name(), e);
            view.notices.push(Notice::Error(format!(
                "Could not fetch market data from {}: {}",
                source.name(),
                e
            )));
            return view;
        }
    };

    if records.is_empty() {
        warn!("{} returned no records", source.name());
        view.notices
            .push(Notice::Error(format!("No market data received from {}.", source.name())));
        return view;
    }

    view.fetched = records.len();
    let as_of = records
        .iter()
        .filter_map(|r| r.as_ref().ok().and_then(|m| m.last_updated))
        .max();
    view.notices.push(Notice::Status(match as_of {
        Some(ts) => format!(
            "Loaded {} coins from {} (data as of {}).",
            records.len(),
            source.name(),
            ts.format("%Y-%m-%d %H:%M UTC")
        ),
        None => format!("Loaded {} coins from {}.", records.len(), source.name()),
    }));

    let report = analyzer.analyze_all(&records, &effective);
    for (reason, count) in report.skip_counts() {
        info!("Skipped {} record(s): {}", count, reason);
    }
    info!(
        "Analysis kept {} of {} records (threshold = {}, min_volume = {})",
        report.results.len(),
        records.len(),
        effective.threshold,
        effective.min_volume
    );

    view.skipped = report.skipped;
    view.results = report.results;
    view
}

mod analyzer;
mod config;
mod fetcher;
mod model;
mod pipeline;
mod presenter;
mod utils;

use analyzer::AnalyzerImpl;
use config::load_config;
use fetcher::CoinGeckoFetcher;
use presenter::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let fetcher = match CoinGeckoFetcher::new(config.api.clone()) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    info!(
        "Screening with threshold = {}%, min_volume = {}",
        config.analysis.threshold, config.analysis.min_volume
    );
    if !config.analysis.use_sidebar_filters {
        // Sidebar values are captured but not passed to the analyzer.
        warn!("Sidebar filters are display-only; set analysis.use_sidebar_filters to apply them");
    }

    let state = Arc::new(AppState {
        source: Arc::new(fetcher),
        analyzer: AnalyzerImpl::new(),
        config,
    });

    if let Err(e) = presenter::serve(state).await {
        error!("Server error: {}", e);
    }
}

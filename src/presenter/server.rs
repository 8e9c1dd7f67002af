use crate::analyzer::AnalyzerImpl;
use crate::config::AppConfig;
use crate::fetcher::MarketSource;
use crate::pipeline::{run_dashboard, DashboardView, SidebarInputs, SidebarParams};
use crate::presenter::error::AppError;
use crate::presenter::html::render_dashboard;

use axum::extract::{Query, State};
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every request handler.
pub struct AppState {
    pub source: Arc<dyn MarketSource>,
    pub analyzer: AnalyzerImpl,
    pub config: AppConfig,
}

impl AppState {
    async fn run(&self, params: &SidebarParams) -> Result<DashboardView, AppError> {
        let inputs = SidebarInputs::from_params(params, &self.config.analysis)
            .map_err(AppError::bad_request)?;
        Ok(run_dashboard(self.source.as_ref(), &self.analyzer, &self.config.analysis, inputs).await)
    }
}

/// GET /
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SidebarParams>,
) -> Result<Html<String>, AppError> {
    let view = state.run(&params).await?;
    Ok(Html(render_dashboard(
        &view,
        &state.config.server.title,
        &state.config.api.vs_currency,
    )))
}

/// GET /api/analysis
async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SidebarParams>,
) -> Result<Json<DashboardView>, AppError> {
    Ok(Json(state.run(&params).await?))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/analysis", get(analysis))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = state.config.server.listen_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::tests::{market, FakeSource};
    use crate::presenter::html::NO_DATA_MESSAGE;

    async fn spawn(source: FakeSource, analysis: AnalysisConfig) -> String {
        let state = Arc::new(AppState {
            source: Arc::new(source),
            analyzer: AnalyzerImpl::new(),
            config: AppConfig {
                analysis,
                ..AppConfig::default()
            },
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn dashboard_renders_table() {
        let base = spawn(FakeSource::Records(market()), AnalysisConfig::default()).await;
        let body = reqwest::get(format!("{}/?threshold=3&min_volume=100", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("<table"));
        assert!(body.contains("bbb coin"));
        assert!(!body.contains("aaa coin"));
    }

    #[tokio::test]
    async fn failing_source_renders_error_and_no_data() {
        let base = spawn(FakeSource::Failing, AnalysisConfig::default()).await;
        let response = reqwest::get(format!("{}/", base)).await.unwrap();
        assert!(response.status().is_success());
        let body = response.text().await.unwrap();
        assert_eq!(body.matches("notice error").count(), 1);
        assert!(body.contains(NO_DATA_MESSAGE));
        assert!(!body.contains("<table"));
    }

    #[tokio::test]
    async fn json_endpoint_applies_sidebar_when_enabled() {
        let analysis = AnalysisConfig {
            use_sidebar_filters: true,
            ..AnalysisConfig::default()
        };
        let base = spawn(FakeSource::Records(market()), analysis).await;
        let view: serde_json::Value = reqwest::get(format!("{}/api/analysis?threshold=10", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let symbols: Vec<&str> = view["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["ccc", "eee"]);
        assert_eq!(view["inputs_applied"], true);
        // three points never cover the 26-point slow window
        assert!(view["results"][0]["macd"].is_null());
    }

    #[tokio::test]
    async fn empty_volume_field_falls_back_to_default() {
        let base = spawn(FakeSource::Records(market()), AnalysisConfig::default()).await;
        let response = reqwest::get(format!("{}/?threshold=5&min_volume=", base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("<table"));
        assert!(body.contains("value=\"1000000\""));
    }

    #[tokio::test]
    async fn non_numeric_threshold_is_a_json_error() {
        let base = spawn(FakeSource::Records(market()), AnalysisConfig::default()).await;
        let response = reqwest::get(format!("{}/api/analysis?threshold=abc", base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "threshold must be a number");
    }

    #[tokio::test]
    async fn negative_volume_is_rejected() {
        let base = spawn(FakeSource::Records(market()), AnalysisConfig::default()).await;
        let response = reqwest::get(format!("{}/api/analysis?min_volume=-1", base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("min_volume"));
    }
}

use crate::config::ApiConfig;
use crate::fetcher::traits::MarketSource;
use crate::model::{FetchError, FetchedRecord, MalformedRecord, MarketRecord};

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Client for the CoinGecko `/coins/markets` endpoint.
pub struct CoinGeckoFetcher {
    client: Client,
    api: ApiConfig,
}

impl CoinGeckoFetcher {
    pub fn new(api: ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(api.user_agent.clone())
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self { client, api })
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", self.api.vs_currency.clone()),
            ("order", self.api.order.clone()),
            ("per_page", self.api.per_page.to_string()),
            ("page", self.api.page.to_string()),
            ("sparkline", self.api.sparkline.to_string()),
        ]
    }
}

/// Decodes the upstream array element by element, so one bad coin does not
/// discard the rest. A body that is not a JSON array is an error.
pub fn decode_records(body: &str) -> Result<Vec<FetchedRecord>, FetchError> {
    let elements: Vec<Value> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let records = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let label = ["symbol", "id", "name"]
                .iter()
                .find_map(|key| element.get(key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("<element {}>", index));
            serde_json::from_value::<MarketRecord>(element).map_err(|e| {
                warn!("Malformed market record {}: {}", label, e);
                MalformedRecord {
                    label,
                    error: e.to_string(),
                }
            })
        })
        .collect();
    Ok(records)
}

#[async_trait::async_trait]
impl MarketSource for CoinGeckoFetcher {
    async fn fetch(&self) -> Result<Vec<FetchedRecord>, FetchError> {
        info!(
            "Fetching {} coins ({}) from {}",
            self.api.per_page, self.api.vs_currency, self.api.base_url
        );

        let mut request = self.client.get(&self.api.base_url).query(&self.query_params());
        if let Some(key) = &self.api.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Market data request failed [{}]", status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let records = decode_records(&body)?;
        info!("Received {} market records", records.len());
        Ok(records)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

use crate::model::{FetchError, FetchedRecord};

#[async_trait::async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetches one page of market snapshots. Elements that fail to decode come
    /// back as `Err` entries; only a failed request or a non-array body is an error.
    async fn fetch(&self) -> Result<Vec<FetchedRecord>, FetchError>;

    /// Human-readable name of the upstream, used in notices.
    fn name(&self) -> &str;
}

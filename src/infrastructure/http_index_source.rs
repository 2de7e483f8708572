use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::entities::index::{IndexId, IndexReading, Provenance};
use crate::domain::errors::{ConfigError, SourceError};
use crate::domain::repositories::index_source::IndexSource;

/// Index payload as served by the index API
#[derive(Debug, Deserialize)]
struct IndexPayload {
    current_index: f64,
    #[serde(default)]
    change: Option<f64>,
    #[serde(default)]
    index_date: Option<NaiveDate>,
}

/// Index source backed by a JSON index API.
///
/// - `GET {base}/indices/{CODE}` is the primary lookup
/// - `GET {base}/search?q={CODE}` is the alternate lookup
pub struct HttpIndexSource {
    client: Client,
    base: Url,
}

impl HttpIndexSource {
    pub fn new(client: Client, base_url: &str) -> Result<Self, ConfigError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(base_url.to_string()));
        }
        Ok(HttpIndexSource { client, base })
    }

    fn current_url(&self, index: IndexId) -> Result<Url, SourceError> {
        self.base
            .join(&format!("indices/{}", index.code()))
            .map_err(|e| SourceError::Unavailable(e.to_string()))
    }

    fn search_url(&self, index: IndexId) -> Result<Url, SourceError> {
        let mut url = self
            .base
            .join("search")
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", index.code());
        Ok(url)
    }

    async fn get(&self, index: IndexId, url: Url) -> Result<IndexReading, SourceError> {
        debug!(index = %index, url = %url, "Fetching index");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Err(SourceError::Empty),
            status if !status.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                return Err(SourceError::Unavailable(format!("HTTP {} - {}", status, error_text)));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unavailable(format!("failed to read body: {}", e)))?;

        parse_index_payload(index, &body)
    }
}

/// Parse an index API body into a reading
pub fn parse_index_payload(index: IndexId, body: &str) -> Result<IndexReading, SourceError> {
    let payload: IndexPayload =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(format!("{}: {}", index, e)))?;

    let reading = IndexReading::new(
        index,
        payload.current_index,
        payload.change,
        payload.index_date.unwrap_or_else(|| Utc::now().date_naive()),
    );

    if reading.is_usable() {
        Ok(reading)
    } else {
        Err(SourceError::Empty)
    }
}

#[async_trait]
impl IndexSource for HttpIndexSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_current(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        let url = self.current_url(index)?;
        self.get(index, url).await
    }

    async fn search_fallback(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        let url = self.search_url(index)?;
        self.get(index, url)
            .await
            .map(|reading| reading.with_provenance(Provenance::FallbackSearch))
    }
}

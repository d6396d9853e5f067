//! Price series client

use crate::api::http::HttpClient;
use crate::config::MarketConfig;
use crate::error::{FetchError, Result};
use crate::model::{PriceRecord, RawPriceRecord, normalize_records};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source of OHLCV series.
///
/// Implementations return records ascending by date. An empty vector means
/// "no data for this window" and is not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<PriceRecord>, FetchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesQuery<'a> {
    symbol: &'a str,
    start_date: String,
    end_date: String,
    page: u32,
    limit: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    data: Option<Vec<RawPriceRecord>>,
}

/// Client for `GET /prices`
#[derive(Debug, Clone)]
pub struct PriceApiClient {
    http: HttpClient,
    page_limit: u32,
}

impl PriceApiClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(
                &config.price_api_base,
                config.request_timeout,
                config.requests_per_minute,
            )?,
            page_limit: config.price_page_limit,
        })
    }
}

/// Decode a `{ data: [...] }` body into sorted records
pub fn parse_series(body: &str) -> std::result::Result<Vec<PriceRecord>, FetchError> {
    let response: SeriesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(normalize_records(response.data.unwrap_or_default()))
}

#[async_trait]
impl PriceSource for PriceApiClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<PriceRecord>, FetchError> {
        let query = SeriesQuery {
            symbol,
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            page: 1,
            limit: self.page_limit,
        };

        let response: SeriesResponse = self.http.get_json("prices", &query).await?;
        let records = normalize_records(response.data.unwrap_or_default());

        tracing::debug!(symbol, %start, %end, count = records.len(), "fetched price series");
        Ok(records)
    }
}

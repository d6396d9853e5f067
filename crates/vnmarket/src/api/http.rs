//! Shared HTTP plumbing for the backend clients

use crate::error::{MarketError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(60) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Response body that may or may not be wrapped in `{ "data": ... }`.
///
/// Every client decodes through this type so call sites only ever see the
/// inner value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } | Envelope::Bare(data) => data,
        }
    }
}

/// JSON client bound to one base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl HttpClient {
    /// Create a client for `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Service root, with or without a trailing slash
    /// * `timeout` - Per-request timeout
    /// * `requests_per_minute` - Client-side budget; 0 is treated as 60
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        requests_per_minute: u32,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(DEFAULT_REQUESTS_PER_MINUTE),
        );

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service-relative path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` with query parameters and decode the JSON body
    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let url = self.url(path);
        debug!("GET {url}");

        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let url = self.url(path);
        debug!("POST {url}");

        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::ApiError {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                }),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pull a readable message out of an error body: `{ "message" }`,
/// `{ "error" }`, or the raw text when it is short.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    (body.len() <= 200).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        symbol: String,
    }

    #[test]
    fn test_envelope_wrapped_and_bare() {
        let wrapped: Envelope<Profile> =
            serde_json::from_value(json!({"data": {"symbol": "FPT"}})).unwrap();
        let bare: Envelope<Profile> = serde_json::from_value(json!({"symbol": "FPT"})).unwrap();

        assert_eq!(wrapped.into_inner(), bare.into_inner());
    }

    #[test]
    fn test_envelope_wrapped_list() {
        let wrapped: Envelope<Vec<u32>> = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);
    }

    #[test]
    fn test_url_joining() {
        let client =
            HttpClient::new("https://api.example.vn/v1/", Duration::from_secs(5), 60).unwrap();
        assert_eq!(client.base_url(), "https://api.example.vn/v1");
        assert_eq!(client.url("/stocks/FPT"), "https://api.example.vn/v1/stocks/FPT");
        assert_eq!(client.url("posts"), "https://api.example.vn/v1/posts");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Symbol not found"}"#),
            Some("Symbol not found".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"Unauthorized"}"#),
            Some("Unauthorized".to_string())
        );
        assert_eq!(error_message("Bad Gateway"), Some("Bad Gateway".to_string()));
        assert_eq!(error_message("   "), None);
        assert_eq!(error_message(&"x".repeat(500)), None);
    }
}

//! Configuration for the backend clients

use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const ENV_PRICE_API_URL: &str = "VNMARKET_PRICE_API_URL";
pub const ENV_API_URL: &str = "VNMARKET_API_URL";
pub const ENV_ANALYSIS_API_URL: &str = "VNMARKET_ANALYSIS_API_URL";
pub const ENV_NEWS_API_URL: &str = "VNMARKET_NEWS_API_URL";

/// Configuration shared by every client in this crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Price series service
    pub price_api_base: String,

    /// Profile, financial metrics, recommendation and auth service
    pub api_base: String,

    /// F-Score / ChatGPT analysis service
    pub analysis_api_base: String,

    /// WordPress-backed news proxy
    pub news_api_base: String,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Client-side request budget per minute
    pub requests_per_minute: u32,

    /// `limit` sent with price series requests
    pub price_page_limit: u32,

    /// Default `per_page` for news listings
    pub news_per_page: u32,

    /// Cache TTL for profile and financial metrics
    pub cache_ttl_profile: Duration,

    /// How long "remind me later" hides the premium popup
    pub popup_snooze: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            price_api_base: "http://localhost:8000/api".to_string(),
            api_base: "http://localhost:8000/api".to_string(),
            analysis_api_base: "http://localhost:8001/api".to_string(),
            news_api_base: "http://localhost:8002/api".to_string(),
            request_timeout: Duration::from_secs(30),
            requests_per_minute: 120,
            price_page_limit: 5000,
            news_per_page: 10,
            cache_ttl_profile: Duration::from_secs(3600), // 1 hour
            popup_snooze: Duration::from_secs(24 * 3600), // 1 day
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Overlay base URLs from the environment
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(url) = env_url(ENV_PRICE_API_URL) {
            self.price_api_base = url;
        }
        if let Some(url) = env_url(ENV_API_URL) {
            self.api_base = url;
        }
        if let Some(url) = env_url(ENV_ANALYSIS_API_URL) {
            self.analysis_api_base = url;
        }
        if let Some(url) = env_url(ENV_NEWS_API_URL) {
            self.news_api_base = url;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, base) in [
            ("price_api_base", &self.price_api_base),
            ("api_base", &self.api_base),
            ("analysis_api_base", &self.analysis_api_base),
            ("news_api_base", &self.news_api_base),
        ] {
            validate_base_url(name, base)?;
        }

        if self.requests_per_minute == 0 {
            return Err(MarketError::ConfigError(
                "requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.price_page_limit == 0 || self.news_per_page == 0 {
            return Err(MarketError::ConfigError(
                "page limits must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_url(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_base_url(name: &str, base: &str) -> Result<()> {
    let url = Url::parse(base)
        .map_err(|e| MarketError::ConfigError(format!("{name} is not a valid URL ({base}): {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(MarketError::ConfigError(format!(
            "{name} must use http or https, got {scheme}"
        ))),
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    price_api_base: Option<String>,
    api_base: Option<String>,
    analysis_api_base: Option<String>,
    news_api_base: Option<String>,
    request_timeout: Option<Duration>,
    requests_per_minute: Option<u32>,
    price_page_limit: Option<u32>,
    news_per_page: Option<u32>,
    cache_ttl_profile: Option<Duration>,
    popup_snooze: Option<Duration>,
}

impl MarketConfigBuilder {
    pub fn price_api_base(mut self, url: impl Into<String>) -> Self {
        self.price_api_base = Some(url.into());
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    pub fn analysis_api_base(mut self, url: impl Into<String>) -> Self {
        self.analysis_api_base = Some(url.into());
        self
    }

    pub fn news_api_base(mut self, url: impl Into<String>) -> Self {
        self.news_api_base = Some(url.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    pub fn requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    pub fn price_page_limit(mut self, limit: u32) -> Self {
        self.price_page_limit = Some(limit);
        self
    }

    pub fn news_per_page(mut self, per_page: u32) -> Self {
        self.news_per_page = Some(per_page);
        self
    }

    pub fn cache_ttl_profile(mut self, duration: Duration) -> Self {
        self.cache_ttl_profile = Some(duration);
        self
    }

    pub fn popup_snooze(mut self, duration: Duration) -> Self {
        self.popup_snooze = Some(duration);
        self
    }

    /// Fill unset base URLs from the environment
    pub fn with_env(mut self) -> Self {
        if self.price_api_base.is_none() {
            self.price_api_base = env_url(ENV_PRICE_API_URL);
        }
        if self.api_base.is_none() {
            self.api_base = env_url(ENV_API_URL);
        }
        if self.analysis_api_base.is_none() {
            self.analysis_api_base = env_url(ENV_ANALYSIS_API_URL);
        }
        if self.news_api_base.is_none() {
            self.news_api_base = env_url(ENV_NEWS_API_URL);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            price_api_base: self.price_api_base.unwrap_or(defaults.price_api_base),
            api_base: self.api_base.unwrap_or(defaults.api_base),
            analysis_api_base: self.analysis_api_base.unwrap_or(defaults.analysis_api_base),
            news_api_base: self.news_api_base.unwrap_or(defaults.news_api_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            requests_per_minute: self.requests_per_minute.unwrap_or(defaults.requests_per_minute),
            price_page_limit: self.price_page_limit.unwrap_or(defaults.price_page_limit),
            news_per_page: self.news_per_page.unwrap_or(defaults.news_per_page),
            cache_ttl_profile: self.cache_ttl_profile.unwrap_or(defaults.cache_ttl_profile),
            popup_snooze: self.popup_snooze.unwrap_or(defaults.popup_snooze),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.requests_per_minute, 120);
        assert_eq!(config.popup_snooze, Duration::from_secs(86_400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MarketConfig::builder()
            .price_api_base("https://prices.example.vn/api")
            .news_per_page(20)
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.price_api_base, "https://prices.example.vn/api");
        assert_eq!(config.news_per_page, 20);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_bad_urls() {
        let err = MarketConfig::builder().api_base("not a url").build();
        assert!(matches!(err, Err(MarketError::ConfigError(_))));

        let err = MarketConfig::builder()
            .news_api_base("ftp://news.example.vn")
            .build();
        assert!(matches!(err, Err(MarketError::ConfigError(msg)) if msg.contains("ftp")));
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let config = MarketConfig {
            requests_per_minute: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MarketConfig {
            price_page_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

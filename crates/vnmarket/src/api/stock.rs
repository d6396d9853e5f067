//! Per-symbol resources: profile, financial metrics, F-Score, recommendation

use crate::api::http::{Envelope, HttpClient};
use crate::cache::{CacheKey, ResponseCache};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::fscore::FScoreFlags;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Company profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockProfile {
    pub symbol: String,
    pub company_name: Option<String>,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub listing_date: Option<String>,
    pub outstanding_shares: Option<f64>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub price_change_percent: Option<f64>,
}

/// Valuation and performance ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialMetrics {
    pub symbol: String,
    pub period: Option<String>,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub ps: Option<f64>,
    pub eps: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub gross_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// F-Score flags and the narrative produced by the analysis service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FScoreReport {
    pub symbol: String,
    pub year: Option<i32>,
    pub quarter: Option<u8>,
    #[serde(flatten)]
    pub flags: FScoreFlags,
    /// Score as reported by the service; may disagree with the flags
    pub fscore: Option<u8>,
    #[serde(alias = "chatgptAnalysis")]
    pub analysis: Option<String>,
}

/// Buy / hold / sell signal with targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingRecommendation {
    pub symbol: String,
    pub recommendation: Option<String>,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub entry_price: Option<f64>,
    pub confidence: Option<f64>,
    pub reason: Option<String>,
    pub updated_at: Option<String>,
}

/// Everything the stock page shows besides the chart
#[derive(Debug, Default)]
pub struct StockOverview {
    pub profile: Option<StockProfile>,
    pub metrics: Option<FinancialMetrics>,
    pub fscore: Option<FScoreReport>,
    pub recommendation: Option<TradingRecommendation>,
}

/// Client for the per-symbol endpoints
#[derive(Clone)]
pub struct StockClient {
    api: HttpClient,
    analysis: HttpClient,
    cache: ResponseCache,
}

/// Trim and upper-case a ticker; blank input is rejected
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MarketError::InvalidSymbol(symbol.to_string()));
    }
    Ok(symbol.to_ascii_uppercase())
}

impl StockClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        Ok(Self {
            api: HttpClient::new(
                &config.api_base,
                config.request_timeout,
                config.requests_per_minute,
            )?,
            analysis: HttpClient::new(
                &config.analysis_api_base,
                config.request_timeout,
                config.requests_per_minute,
            )?,
            cache: ResponseCache::new(config.cache_ttl_profile),
        })
    }

    /// `GET /stocks/{symbol}`
    pub async fn profile(&self, symbol: &str) -> Result<StockProfile> {
        let symbol = normalize_symbol(symbol)?;
        let path = format!("stocks/{symbol}");
        self.cache
            .get_or_fetch(CacheKey::new("profile", &symbol), || {
                fetch_resource(&self.api, &path)
            })
            .await
    }

    /// `GET /financial-metrics/{symbol}`
    pub async fn financial_metrics(&self, symbol: &str) -> Result<FinancialMetrics> {
        let symbol = normalize_symbol(symbol)?;
        let path = format!("financial-metrics/{symbol}");
        self.cache
            .get_or_fetch(CacheKey::new("metrics", &symbol), || {
                fetch_resource(&self.api, &path)
            })
            .await
    }

    /// `GET /trading-recommendations/{symbol}`
    pub async fn recommendation(&self, symbol: &str) -> Result<TradingRecommendation> {
        let symbol = normalize_symbol(symbol)?;
        fetch_resource(&self.api, &format!("trading-recommendations/{symbol}")).await
    }

    /// `GET /fscore/{symbol}` on the analysis service
    pub async fn fscore(&self, symbol: &str) -> Result<FScoreReport> {
        let symbol = normalize_symbol(symbol)?;
        fetch_resource(&self.analysis, &format!("fscore/{symbol}")).await
    }

    /// Fetch all four resources concurrently.
    ///
    /// A failing resource is logged and left as `None`; only an invalid
    /// symbol fails the whole call.
    pub async fn overview(&self, symbol: &str) -> Result<StockOverview> {
        let symbol = normalize_symbol(symbol)?;

        let (profile, metrics, fscore, recommendation) = futures::join!(
            self.profile(&symbol),
            self.financial_metrics(&symbol),
            self.fscore(&symbol),
            self.recommendation(&symbol),
        );

        Ok(StockOverview {
            profile: log_failure("profile", &symbol, profile),
            metrics: log_failure("financial metrics", &symbol, metrics),
            fscore: log_failure("fscore", &symbol, fscore),
            recommendation: log_failure("recommendation", &symbol, recommendation),
        })
    }
}

async fn fetch_resource<T: DeserializeOwned>(http: &HttpClient, path: &str) -> Result<T> {
    let envelope: Envelope<T> = http.get_json(path, &[] as &[(&str, &str)]).await?;
    Ok(envelope.into_inner())
}

fn log_failure<T>(resource: &str, symbol: &str, result: Result<T>) -> Option<T> {
    result
        .inspect_err(|e| tracing::warn!(symbol, "failed to load {resource}: {e}"))
        .ok()
}

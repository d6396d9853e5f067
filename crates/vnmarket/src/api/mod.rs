//! Clients for the backend REST services

pub mod auth;
pub mod http;
pub mod news;
pub mod price;
pub mod stock;

pub use auth::{AuthClient, AuthSession, AuthUser};
pub use http::{Envelope, HttpClient};
pub use news::{NewsClient, Pagination, Post, PostPage, PostQuery, PostRef};
pub use price::{PriceApiClient, PriceSource};
pub use stock::{
    FScoreReport, FinancialMetrics, StockClient, StockOverview, StockProfile,
    TradingRecommendation,
};

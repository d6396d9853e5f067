//! Data and coordination layer for a Vietnamese stock-market site
//!
//! This crate covers everything between the REST backends and the pixels:
//!
//! - Time-range labels (`1d` .. `all`) resolved to concrete date windows
//! - Price series fetching with validation, sorting and de-duplication
//! - Clients for stock profiles, financial metrics, F-Score, recommendations,
//!   news and authentication
//! - A three-pane chart (candles, indicators, volume) whose panes scroll and
//!   zoom together, built on injected drawing surfaces
//! - A chart host that drives fetch -> render and drops stale responses
//! - Injected key-value stores for session and premium-popup state
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Mutex;
//! use vnmarket::chart::{Broadcaster, ChartOptions, ChartRenderer, HeadlessFactory};
//! use vnmarket::host::{self, ChartHost, QueryParams};
//! use vnmarket::{MarketConfig, PriceApiClient, TimeRangeSelection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MarketConfig::default().with_env()?;
//!     let source = PriceApiClient::new(&config)?;
//!
//!     let renderer =
//!         ChartRenderer::new(HeadlessFactory::new(), ChartOptions::default(), Broadcaster::new());
//!     let chart = Mutex::new(ChartHost::new(renderer));
//!
//!     let today = chrono::Local::now().date_naive();
//!     let selection = TimeRangeSelection::new("VNINDEX", "1m", today);
//!     host::load(&chart, &source, QueryParams::from(&selection)).await;
//!
//!     println!("{:?}", chart.lock().unwrap().render_branch());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod format;
pub mod fscore;
pub mod host;
pub mod model;
pub mod popup;
pub mod range;
pub mod storage;

pub use api::{AuthClient, NewsClient, PriceApiClient, PriceSource, StockClient};
pub use config::MarketConfig;
pub use error::{FetchError, MarketError, Result, StorageError, SurfaceError};
pub use host::{ApplyOutcome, ChartHost, HostState, QueryParams, RenderBranch};
pub use model::{Direction, PriceRecord};
pub use range::{RangeLabel, TimeRangeSelection};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageKey};

pub use vnmarket_utils::{Config as AppConfig, init_tracing};

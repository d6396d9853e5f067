//! Shared utilities for vnmarket
//!
//! This crate provides common functionality used across the vnmarket workspace:
//! tracing setup and the application-level configuration.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{init_tracing, init_tracing_with};

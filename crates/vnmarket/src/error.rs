//! Error types for market data operations

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum MarketError {
    /// Backend responded with a non-success status
    #[error("API error {status}: {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Required input missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication rejected or session unusable
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Price series fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Chart surface error
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Key-value store error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Convert anyhow::Error to MarketError
impl From<anyhow::Error> for MarketError {
    fn from(err: anyhow::Error) -> Self {
        MarketError::Other(err.to_string())
    }
}

/// Failure fetching a price series.
///
/// An empty series is not an error; these variants only cover transport,
/// status and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request never produced a response (DNS, connect, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// Response status outside 2xx
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message shown to the user: the cause plus a retry hint
    pub fn user_message(&self) -> String {
        format!("Unable to load price data ({self}). Please try again later.")
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<MarketError> for FetchError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Fetch(e) => e,
            MarketError::ApiError { status, message } => FetchError::Status { status, message },
            MarketError::NetworkError(e) => e.into(),
            MarketError::JsonError(e) => FetchError::Decode(e.to_string()),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Failure reported by a chart surface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("failed to create {pane} surface: {reason}")]
    Create { pane: String, reason: String },

    #[error("{pane} surface rejected series: {reason}")]
    Series { pane: String, reason: String },

    #[error("{pane} surface already released")]
    Released { pane: String },

    #[error("failed to release {pane} surface: {reason}")]
    Release { pane: String, reason: String },
}

/// Failure reading or writing the key-value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::InvalidSymbol(String::new());
        assert_eq!(err.to_string(), "Invalid symbol: ");

        let err = MarketError::ApiError {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: not found");
    }

    #[test]
    fn test_fetch_error_user_message() {
        let err = FetchError::Transport("connection refused".to_string());
        let msg = err.user_message();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("try again later"));
        assert_eq!(err.status(), None);

        let err = FetchError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_fetch_error_from_market_error() {
        let err: FetchError = MarketError::ApiError {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(
            err,
            FetchError::Status {
                status: 500,
                message: "boom".to_string()
            }
        );

        let inner = FetchError::Decode("bad".to_string());
        let err: FetchError = MarketError::Fetch(inner.clone()).into();
        assert_eq!(err, inner);
    }
}

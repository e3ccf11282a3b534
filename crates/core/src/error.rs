//! Error types for the prediction pipeline.
//!
//! Only [`PipelineError`] ever terminates a request. [`UpstreamError`] is what
//! collaborators return; the pipeline absorbs it into a degraded value.

use thiserror::Error;

/// Machine-readable code for an invalid symbol.
pub const CODE_INVALID_SYMBOL: &str = "INVALID_SYMBOL";
/// Machine-readable code for an invalid interval.
pub const CODE_INVALID_INTERVAL: &str = "INVALID_INTERVAL";
/// Machine-readable code when no source yields a usable price.
pub const CODE_DATA_UNAVAILABLE: &str = "DATA_UNAVAILABLE";

/// Input rejected before any pipeline stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Symbol missing or blank.
    #[error("symbol is required")]
    EmptySymbol,

    /// Symbol present but malformed.
    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol {
        /// The rejected symbol.
        symbol: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Interval outside the supported set.
    #[error("invalid interval '{0}', must be one of: 1m, 5m, 10m, 15m, 30m, 1h")]
    InvalidInterval(String),
}

impl ValidationError {
    /// Creates an invalid symbol error.
    pub fn invalid_symbol(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSymbol {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptySymbol | Self::InvalidSymbol { .. } => CODE_INVALID_SYMBOL,
            Self::InvalidInterval(_) => CODE_INVALID_INTERVAL,
        }
    }
}

/// Failure of an external collaborator (market data, order book, news, language model).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Upstream API answered with a non-success status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from API.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Collaborator has no credentials or endpoint configured.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl UpstreamError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if the error indicates the request could succeed later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::Parse(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Errors that abort a prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Request input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No source produced a valid current price.
    #[error(
        "Unable to fetch current price for {symbol}. The stock symbol may be invalid, delisted, \
         or not supported by the data providers. Please try a different symbol (e.g., AAPL, MSFT \
         for US stocks, or BBCA.JK, TLKM.JK for Indonesian stocks)."
    )]
    DataUnavailable {
        /// The symbol that was requested.
        symbol: String,
        /// Names of the sources that were tried.
        attempted_sources: Vec<String>,
    },
}

impl PipelineError {
    /// Creates a data-unavailable error.
    pub fn data_unavailable(symbol: impl Into<String>, attempted_sources: Vec<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            attempted_sources,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::DataUnavailable { .. } => CODE_DATA_UNAVAILABLE,
        }
    }
}

/// Result type alias for collaborator calls.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Construction Tests ====================

    #[test]
    fn test_api_error_construction() {
        let err = UpstreamError::api(503, "service unavailable");
        assert!(matches!(
            err,
            UpstreamError::Api {
                status_code: 503,
                ..
            }
        ));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("service unavailable"));
    }

    #[test]
    fn test_data_unavailable_names_symbol() {
        let err = PipelineError::data_unavailable("ZZZZ", vec!["yahoo".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("ZZZZ"));
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("BBCA.JK"));
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_is_transient() {
        assert!(UpstreamError::Network("reset".into()).is_transient());
        assert!(UpstreamError::Timeout("10s".into()).is_transient());
        assert!(UpstreamError::api(500, "").is_transient());
        assert!(UpstreamError::api(429, "").is_transient());
        assert!(!UpstreamError::api(404, "").is_transient());
        assert!(!UpstreamError::Parse("bad json".into()).is_transient());
        assert!(!UpstreamError::NotConfigured("no key".into()).is_transient());
    }

    #[test]
    fn test_codes() {
        assert_eq!(ValidationError::EmptySymbol.code(), CODE_INVALID_SYMBOL);
        assert_eq!(
            ValidationError::InvalidInterval("2m".into()).code(),
            CODE_INVALID_INTERVAL
        );
        let err: PipelineError = ValidationError::invalid_symbol("A/B", "bad char").into();
        assert_eq!(err.code(), CODE_INVALID_SYMBOL);
        assert_eq!(
            PipelineError::data_unavailable("X", vec![]).code(),
            CODE_DATA_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: PipelineError = ValidationError::InvalidInterval("2m".into()).into();
        assert!(err.to_string().contains("2m"));
    }
}

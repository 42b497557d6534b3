/// Structured error types for tokenscope
///
/// Provider calls, configuration loading and cache plumbing each get their own
/// error enum. Provider errors carry enough detail for the retry policy to decide
/// whether another attempt can help.
use thiserror::Error;

// =============================================================================
// PROVIDER / TRANSPORT ERRORS
// =============================================================================

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Connection refused, reset, or any other transport-level failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Hostname could not be resolved
    #[error("DNS resolution failed: {0}")]
    DnsFailure(String),

    #[error("Request timeout")]
    Timeout,

    /// 429 from the provider
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// 401 from the provider
    #[error("Unauthorized (HTTP 401)")]
    Unauthorized,

    /// Any other non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Body could not be decoded into the provider schema
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API disabled")]
    Disabled,
}

impl ApiError {
    /// Map a reqwest transport error onto the taxonomy
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout;
        }

        if err.is_decode() {
            return ApiError::InvalidResponse(err.to_string());
        }

        if let Some(status) = err.status() {
            return ApiError::from_status(status.as_u16(), String::new());
        }

        let message = format!("{:?}", err);
        if is_dns_failure(&message) {
            ApiError::DnsFailure(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            429 => ApiError::RateLimitExceeded,
            _ => ApiError::HttpStatus { status, body },
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::RateLimitExceeded => Some(429),
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures that mean "this optional provider is not usable right now"
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::DnsFailure(_) | ApiError::Disabled
        )
    }
}

fn is_dns_failure(debug_message: &str) -> bool {
    let lower = debug_message.to_lowercase();
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
}

/// Classification used by the retry policy
///
/// Implemented by every error type that flows through `apis::retry::execute`.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::NetworkError(_)
            | ApiError::DnsFailure(_)
            | ApiError::Timeout
            | ApiError::RateLimitExceeded => true,
            ApiError::HttpStatus { status, .. } => !(400..500).contains(status),
            ApiError::Unauthorized | ApiError::InvalidResponse(_) | ApiError::Disabled => false,
        }
    }
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid config field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// CACHE ERRORS
// =============================================================================

/// Backend failure inside the cache store
///
/// Never escapes `CacheStore`; it only flips the store into fallback mode.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Invalid cache pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() || err.is_io_error() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

// =============================================================================
// AGGREGATION ERRORS
// =============================================================================

/// Failure inside one aggregation cycle
///
/// Never surfaces to callers of `AggregationEngine::aggregate`; it only drives
/// the degrade-to-empty path and its log line.
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    #[error("Aggregation cycle panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(401, String::new()),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(429, String::new()),
            ApiError::RateLimitExceeded
        ));
        assert_eq!(ApiError::from_status(503, "down".into()).status(), Some(503));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::NetworkError("reset".into()).is_retryable());
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::RateLimitExceeded.is_retryable());
        assert!(ApiError::from_status(500, String::new()).is_retryable());
        assert!(ApiError::from_status(502, String::new()).is_retryable());

        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::from_status(404, String::new()).is_retryable());
        assert!(!ApiError::from_status(400, String::new()).is_retryable());
        assert!(!ApiError::InvalidResponse("bad json".into()).is_retryable());
        assert!(!ApiError::Disabled.is_retryable());
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(ApiError::Unauthorized.is_unavailable());
        assert!(ApiError::DnsFailure("no such host".into()).is_unavailable());
        assert!(!ApiError::Timeout.is_unavailable());
    }

    #[test]
    fn test_dns_failure_detection() {
        assert!(is_dns_failure("hyper::Error(Connect, ConnectError(\"dns error\", ...))"));
        assert!(is_dns_failure("failed to lookup address information"));
        assert!(!is_dns_failure("connection refused"));
    }
}

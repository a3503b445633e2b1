//! Stable error taxonomy for usage fetches.

use std::time::Duration;

use thiserror::Error;

/// Error text for a missing OAuth token
pub const ERR_MISSING_TOKEN: &str = "missing OAuth token";
/// Error text for a blank protocol header value
pub const ERR_MISSING_HEADER: &str = "beta header required";
/// Shown when a successful response carried no displayable window
pub const TEXT_NO_DATA: &str = "No utilization data available.";

/// Sub-kind of a malformed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// No bearer token was supplied; no request was made
    MissingToken,
    /// The protocol header value was blank; no request was made
    MissingHeader,
    /// The response body could not be decoded
    Decode,
}

/// A fetch failure classified once, then shared read-only.
///
/// `NoData` is soft: the response was valid but had nothing to draw.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifiedError {
    /// The per-fetch deadline elapsed
    #[error("request timed out")]
    Timeout,

    /// The fetch was canceled (superseded or shutting down)
    #[error("request canceled")]
    Canceled,

    /// The endpoint answered with status >= 300
    #[error("http {code}: {body}")]
    HttpStatus {
        code: u16,
        /// Response body (truncated), possibly annotated with header guidance
        body: String,
        /// Server retry hint; zero when absent or unparseable
        retry_after: Duration,
    },

    /// Connection-level failure (DNS, TLS, reset, ...)
    #[error("{message}")]
    Transport { message: String },

    /// Request never made, or response undecodable
    #[error("{message}")]
    Malformed { kind: MalformedKind, message: String },

    /// Valid response with zero usable windows
    #[error("{}", TEXT_NO_DATA)]
    NoData,
}

impl ClassifiedError {
    pub fn missing_token() -> Self {
        Self::Malformed {
            kind: MalformedKind::MissingToken,
            message: ERR_MISSING_TOKEN.to_string(),
        }
    }

    pub fn missing_header() -> Self {
        Self::Malformed {
            kind: MalformedKind::MissingHeader,
            message: ERR_MISSING_HEADER.to_string(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Malformed {
            kind: MalformedKind::Decode,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Server-provided retry hint (zero means "no hint")
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::HttpStatus { retry_after, .. } => *retry_after,
            _ => Duration::ZERO,
        }
    }

    /// HTTP status code, if this came from a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Soft errors are displayed but never counted as failures
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Configuration-level failures detected before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Malformed {
                kind: MalformedKind::MissingToken | MalformedKind::MissingHeader,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_only_for_http_status() {
        let err = ClassifiedError::HttpStatus {
            code: 429,
            body: String::new(),
            retry_after: Duration::from_secs(30),
        };
        assert_eq!(err.retry_after(), Duration::from_secs(30));
        assert_eq!(err.status(), Some(429));

        assert_eq!(ClassifiedError::Timeout.retry_after(), Duration::ZERO);
        assert_eq!(ClassifiedError::transport("reset").status(), None);
    }

    #[test]
    fn test_classification_flags() {
        assert!(ClassifiedError::NoData.is_soft());
        assert!(!ClassifiedError::Timeout.is_soft());
        assert!(ClassifiedError::missing_token().is_configuration());
        assert!(ClassifiedError::missing_header().is_configuration());
        assert!(!ClassifiedError::decode("bad json").is_configuration());
    }

    #[test]
    fn test_display() {
        assert_eq!(ClassifiedError::Timeout.to_string(), "request timed out");
        assert_eq!(ClassifiedError::Canceled.to_string(), "request canceled");
        assert_eq!(ClassifiedError::NoData.to_string(), TEXT_NO_DATA);
        assert_eq!(
            ClassifiedError::missing_token().to_string(),
            "missing OAuth token"
        );
        let err = ClassifiedError::HttpStatus {
            code: 500,
            body: "oops".to_string(),
            retry_after: Duration::ZERO,
        };
        assert_eq!(err.to_string(), "http 500: oops");
    }
}

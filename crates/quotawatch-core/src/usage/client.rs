//! HTTP client for the OAuth usage endpoint.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ClassifiedError;
use super::types::UsageSnapshot;

/// Fixed usage endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
/// Name of the protocol header the endpoint requires
pub const BETA_HEADER_NAME: &str = "anthropic-beta";
/// Baked-in beta header value; the service rotates these
pub const DEFAULT_BETA_HEADER: &str = "oauth-2025-04-20";

/// Appended to error bodies while the baked-in beta header is in use
const BETA_HINT: &str =
    " (beta header may be outdated; set --beta-header or ANTHROPIC_BETA_HEADER)";

/// Longest server retry hint honored
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Cap for a successful body handed to the decoder
const MAX_BODY_BYTES: usize = 32 << 10;
/// Cap for an error body kept for display
const MAX_ERROR_BODY_BYTES: usize = 4 << 10;

/// Deadline and cancellation handle for one fetch
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl FetchContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }
}

/// Boxed future returned by [`UsageFetcher::fetch`]
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<UsageSnapshot, ClassifiedError>> + Send>>;

/// Capability the refresh runner uses to obtain a snapshot.
///
/// Implementations must honor `ctx.cancel` and `ctx.timeout`, reporting
/// `Canceled` and `Timeout` respectively, and must not retry.
pub trait UsageFetcher: Send + Sync + 'static {
    fn fetch(&self, ctx: FetchContext) -> FetchFuture;
}

/// Connection settings for [`UsageClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
    pub beta_header: String,
    /// Whole-request timeout applied by the HTTP layer
    pub timeout: Duration,
}

/// reqwest-backed usage client
#[derive(Debug, Clone)]
pub struct UsageClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    beta_header: String,
}

impl UsageClient {
    /// Build a client with a pooled connection and the given timeout
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("quotawatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            token: config.token,
            beta_header: config.beta_header,
        })
    }

    /// Fetch and decode usage once, classifying every failure.
    ///
    /// Missing token or header fail before any network call. The future
    /// resolves to `Canceled` as soon as `ctx.cancel` fires and to `Timeout`
    /// once `ctx.timeout` elapses.
    pub async fn fetch_usage(
        &self,
        ctx: &FetchContext,
        token: &str,
        beta_header: &str,
    ) -> Result<UsageSnapshot, ClassifiedError> {
        if token.trim().is_empty() {
            return Err(ClassifiedError::missing_token());
        }
        let beta_header = beta_header.trim();
        if beta_header.is_empty() {
            return Err(ClassifiedError::missing_header());
        }

        let request = self
            .http
            .get(&self.endpoint)
            .bearer_auth(token.trim())
            .header(BETA_HEADER_NAME, beta_header)
            .header(ACCEPT, "application/json");

        let endpoint = self.endpoint.as_str();
        let work = async move {
            debug!("Usage fetch: GET {}", endpoint);
            let response = request.send().await.map_err(classify_transport)?;
            read_response(response, beta_header).await
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(ClassifiedError::Canceled),
            result = tokio::time::timeout(ctx.timeout, work) => {
                result.unwrap_or(Err(ClassifiedError::Timeout))
            }
        }
    }
}

impl UsageFetcher for UsageClient {
    fn fetch(&self, ctx: FetchContext) -> FetchFuture {
        let client = self.clone();
        Box::pin(async move {
            client
                .fetch_usage(&ctx, &client.token, &client.beta_header)
                .await
        })
    }
}

/// Turn a response into a snapshot or an `HttpStatus`/`Malformed` error
async fn read_response(
    response: reqwest::Response,
    beta_header: &str,
) -> Result<UsageSnapshot, ClassifiedError> {
    let status = response.status().as_u16();
    debug!("Usage fetch: status {}", status);

    if status >= 300 {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|raw| parse_retry_after(raw, Utc::now()))
            .unwrap_or(Duration::ZERO);
        let raw = read_capped(response, MAX_ERROR_BODY_BYTES)
            .await
            .unwrap_or_default();
        return Err(ClassifiedError::HttpStatus {
            code: status,
            body: annotate_body(&String::from_utf8_lossy(&raw), beta_header),
            retry_after,
        });
    }

    let body = read_capped(response, MAX_BODY_BYTES)
        .await
        .map_err(classify_transport)?;
    decode_usage(&body)
}

/// Decode a success body into a snapshot
pub fn decode_usage(body: &[u8]) -> Result<UsageSnapshot, ClassifiedError> {
    serde_json::from_slice(body).map_err(|e| ClassifiedError::decode(format!("decode usage: {}", e)))
}

/// Trim an error body and add header guidance when the default is in use
pub fn annotate_body(body: &str, beta_header: &str) -> String {
    let mut text = body.trim().to_string();
    if beta_header == DEFAULT_BETA_HEADER {
        text.push_str(BETA_HINT);
    }
    text
}

/// Parse a `Retry-After` value: whole seconds or an HTTP-date.
///
/// Unparseable values and dates not in the future yield zero (no hint).
/// Hints are capped at [`MAX_RETRY_AFTER`].
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Duration {
    let raw = raw.trim();
    if raw.is_empty() {
        return Duration::ZERO;
    }
    let hint = match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => DateTime::parse_from_rfc2822(raw)
            .ok()
            .and_then(|at| at.with_timezone(&Utc).signed_duration_since(now).to_std().ok())
            .unwrap_or(Duration::ZERO),
    };
    hint.min(MAX_RETRY_AFTER)
}

/// Read at most `limit` bytes of the body, dropping the rest
async fn read_capped(mut response: reqwest::Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() >= limit {
            break;
        }
    }
    Ok(buf)
}

fn classify_transport(err: reqwest::Error) -> ClassifiedError {
    if err.is_timeout() {
        return ClassifiedError::Timeout;
    }
    ClassifiedError::transport(error_chain(&err))
}

/// Flatten an error and its sources into one line
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::MalformedKind;
    use chrono::TimeZone;

    fn client() -> UsageClient {
        UsageClient::new(ClientConfig {
            // Nothing listens here; tests below never reach the network
            endpoint: "http://127.0.0.1:9/usage".to_string(),
            token: "tok".to_string(),
            beta_header: DEFAULT_BETA_HEADER.to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_request() {
        let ctx = FetchContext::new(Duration::from_secs(1));
        let err = client()
            .fetch_usage(&ctx, "   ", DEFAULT_BETA_HEADER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifiedError::Malformed {
                kind: MalformedKind::MissingToken,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_header_fails_without_request() {
        let ctx = FetchContext::new(Duration::from_secs(1));
        let err = client().fetch_usage(&ctx, "tok", "").await.unwrap_err();
        assert!(matches!(
            err,
            ClassifiedError::Malformed {
                kind: MalformedKind::MissingHeader,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_canceled_context() {
        let ctx = FetchContext::new(Duration::from_secs(5));
        ctx.cancel.cancel();
        let err = client()
            .fetch_usage(&ctx, "tok", DEFAULT_BETA_HEADER)
            .await
            .unwrap_err();
        assert_eq!(err, ClassifiedError::Canceled);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("30", now), Duration::from_secs(30));
        assert_eq!(parse_retry_after(" 5 ", now), Duration::from_secs(5));
        assert_eq!(parse_retry_after("0", now), Duration::ZERO);
        assert_eq!(parse_retry_after("-3", now), Duration::ZERO);
        // Only whole seconds are valid
        assert_eq!(parse_retry_after("1.5", now), Duration::ZERO);
        assert_eq!(parse_retry_after("inf", now), Duration::ZERO);
        assert_eq!(parse_retry_after("NaN", now), Duration::ZERO);
        assert_eq!(parse_retry_after("1e19", now), Duration::ZERO);
    }

    #[test]
    fn test_parse_retry_after_capped() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 0).unwrap();
        assert_eq!(parse_retry_after("10000000000000000000", now), MAX_RETRY_AFTER);
        assert_eq!(parse_retry_after("86401", now), MAX_RETRY_AFTER);
        assert_eq!(
            parse_retry_after("Fri, 31 Dec 9999 23:59:59 GMT", now),
            MAX_RETRY_AFTER
        );
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 0).unwrap();
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Duration::from_secs(60)
        );
        // Dates in the past carry no hint
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", now),
            Duration::ZERO
        );
    }

    #[test]
    fn test_parse_retry_after_garbage() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("", now), Duration::ZERO);
        assert_eq!(parse_retry_after("soon", now), Duration::ZERO);
    }

    #[test]
    fn test_annotate_body() {
        assert_eq!(
            annotate_body("  denied \n", DEFAULT_BETA_HEADER),
            format!("denied{}", BETA_HINT)
        );
        assert_eq!(annotate_body("denied", "oauth-2099-01-01"), "denied");
    }

    #[test]
    fn test_decode_usage_malformed() {
        let err = decode_usage(b"{not json").unwrap_err();
        assert!(matches!(
            err,
            ClassifiedError::Malformed {
                kind: MalformedKind::Decode,
                ..
            }
        ));

        let err = decode_usage(br#"{"five_hour":{"utilization":1,"resets_at":"bad"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("resets_at"));
    }

    #[test]
    fn test_decode_usage_ok() {
        let snapshot = decode_usage(
            br#"{"five_hour":{"utilization":42.0,"resets_at":"2025-01-01T10:00:00Z"},"seven_day":null}"#,
        )
        .unwrap();
        assert_eq!(snapshot.five_hour_percent(), Some(42.0));
        assert_eq!(snapshot.seven_day_percent(), None);
    }
}

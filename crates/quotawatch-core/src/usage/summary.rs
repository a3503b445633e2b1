//! Single-line, user-facing rendering of a [`ClassifiedError`].

use serde::Deserialize;

use super::error::ClassifiedError;
use crate::format::truncate;

/// Character budget for the error line
pub const MAX_ERROR_CHARS: usize = 120;

const SEPARATOR: &str = " · ";

/// Structured error body, either `{"error":{...}}` or flat `{"message":...}`
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Build the one-line summary shown in the error box.
///
/// Joins status, human summary and error code with " · ", preferring a
/// structured body message over raw body text, then truncates.
pub fn summarize(err: &ClassifiedError) -> String {
    let (status, body) = match err {
        ClassifiedError::HttpStatus { code, body, .. } => {
            (Some(format!("http {}", code)), body.trim().to_string())
        }
        other => (None, other.to_string().trim().to_string()),
    };

    let (summary, code) = extract_message(&body).unwrap_or((body, None));

    let parts: Vec<String> = [status, Some(summary), code.map(|c| format!("code: {}", c))]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();

    truncate(&parts.join(SEPARATOR), MAX_ERROR_CHARS)
}

/// Pull `(message, error_code)` out of a JSON error body.
///
/// Trailing annotations after the JSON value (such as header guidance) are
/// tolerated; only the leading value is parsed.
fn extract_message(body: &str) -> Option<(String, Option<String>)> {
    if !body.starts_with('{') {
        return None;
    }
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<ErrorPayload>();
    let payload = stream.next()?.ok()?;

    if let Some(detail) = payload.error {
        if let Some(message) = detail.message.filter(|m| !m.is_empty()) {
            return Some((message, detail.error_code.filter(|c| !c.is_empty())));
        }
    }
    payload
        .message
        .filter(|m| !m.is_empty())
        .map(|m| (m, payload.error_code.filter(|c| !c.is_empty())))
}

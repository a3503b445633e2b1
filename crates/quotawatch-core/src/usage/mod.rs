//! Usage monitoring: fetch and decode the OAuth usage endpoint.
//!
//! The client issues one authenticated GET per call, decodes the two rolling
//! windows, and classifies every failure into [`ClassifiedError`]. It never
//! retries; retry policy belongs to [`crate::refresh`].

pub mod client;
pub mod error;
pub mod summary;
pub mod types;

pub use client::{
    ClientConfig, FetchContext, FetchFuture, UsageClient, UsageFetcher, BETA_HEADER_NAME,
    DEFAULT_BETA_HEADER, DEFAULT_ENDPOINT, MAX_RETRY_AFTER,
};
pub use error::{ClassifiedError, MalformedKind, TEXT_NO_DATA};
pub use summary::summarize;
pub use types::{UsageRow, UsageSnapshot, UsageWindow, LABEL_CURRENT, LABEL_WEEKLY};

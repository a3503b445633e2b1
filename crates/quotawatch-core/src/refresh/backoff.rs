//! Failure backoff and per-fetch deadline policy.

use std::time::Duration;

use rand::RngExt;

use crate::usage::MAX_RETRY_AFTER;

/// Highest doubling step; backoff never exceeds `interval * 2^MAX_BACKOFF_STEP`
pub const MAX_BACKOFF_STEP: u32 = 3;

/// Deadline used when neither the client timeout nor the interval is usable
pub const MIN_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Deterministic part of the backoff: `interval * 2^min(failures, 3)`.
///
/// Zero failures or a zero interval leave the interval unchanged.
pub fn base_backoff(interval: Duration, failures: u32) -> Duration {
    if failures == 0 || interval.is_zero() {
        return interval;
    }
    let step = failures.min(MAX_BACKOFF_STEP);
    let cap = interval.saturating_mul(1 << MAX_BACKOFF_STEP);
    interval.saturating_mul(1 << step).min(cap)
}

/// Delay before the next tick after a failure.
///
/// A positive server hint wins verbatim, up to [`MAX_RETRY_AFTER`]. Otherwise
/// the base backoff gets up to +20% jitter drawn uniformly from
/// `[0, backoff / 5)`.
pub fn backoff_delay<R: RngExt + ?Sized>(
    interval: Duration,
    failures: u32,
    retry_after: Duration,
    rng: &mut R,
) -> Duration {
    if !retry_after.is_zero() {
        return retry_after.min(MAX_RETRY_AFTER);
    }
    if failures == 0 || interval.is_zero() {
        return interval;
    }
    let backoff = base_backoff(interval, failures);
    let jitter_cap = u64::try_from((backoff / 5).as_nanos()).unwrap_or(u64::MAX);
    if jitter_cap == 0 {
        return backoff;
    }
    backoff.saturating_add(Duration::from_nanos(rng.random_range(0..jitter_cap)))
}

/// Deadline for one fetch: the smaller of the client timeout and the refresh
/// interval, so a slow call cannot hold more than one polling cycle.
pub fn fetch_timeout(client_timeout: Duration, interval: Duration) -> Duration {
    match (client_timeout.is_zero(), interval.is_zero()) {
        (false, false) => client_timeout.min(interval),
        (false, true) => client_timeout,
        (true, false) => interval,
        (true, true) => MIN_FETCH_TIMEOUT,
    }
}

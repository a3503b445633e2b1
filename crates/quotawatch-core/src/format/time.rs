//! Reset countdowns and "updated ago" phrasing.

use chrono::{DateTime, Local, TimeDelta, Utc};

/// Shown in place of a countdown once the reset moment has passed
pub const TEXT_RESET_SOON: &str = "resets soon";
/// Shown when the last update is under five seconds old
pub const TEXT_UPDATED_NOW: &str = "updated right now";
/// Duration bucket below one minute
pub const TEXT_LT_MINUTE: &str = "less than a minute";

/// Layout for the local reset timestamp, e.g. "14:05 +09:00 Mar 03".
///
/// `Local` carries no zone abbreviation, so the zone is the numeric offset.
const RESET_TIME_LAYOUT: &str = "%H:%M %:z %b %d";

/// Render a positive duration in compact buckets (5m, 2h30m, 3d 4h).
pub fn friendly_duration(d: TimeDelta) -> String {
    if d < TimeDelta::minutes(1) {
        return TEXT_LT_MINUTE.to_string();
    }
    if d < TimeDelta::hours(1) {
        return format!("{}m", d.num_minutes());
    }
    if d < TimeDelta::hours(24) {
        let hours = d.num_hours();
        let minutes = d.num_minutes() % 60;
        return if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, minutes)
        };
    }
    let days = d.num_hours() / 24;
    let hours = d.num_hours() % 24;
    if hours == 0 {
        format!("{}d", days)
    } else {
        format!("{}d {}h", days, hours)
    }
}

/// Build the `(reset, remaining)` labels for a window reset timestamp.
///
/// The reset label is rendered in local time. The remaining label never shows
/// a negative duration: once `reset_at` is not in the future it reads
/// [`TEXT_RESET_SOON`].
pub fn format_reset(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> (String, String) {
    let local = reset_at.with_timezone(&Local);
    let reset = format!("resets at {}", local.format(RESET_TIME_LAYOUT));

    let left = reset_at.signed_duration_since(now);
    let remaining = if left > TimeDelta::zero() {
        format!("{} left", friendly_duration(left))
    } else {
        TEXT_RESET_SOON.to_string()
    };

    (reset, remaining)
}

/// Describe how long ago `at` happened, coarsened for a status line.
pub fn human_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(at);
    if diff < TimeDelta::seconds(5) {
        return TEXT_UPDATED_NOW.to_string();
    }
    if diff < TimeDelta::minutes(1) {
        let secs = diff.num_seconds();
        let secs = if secs < 10 { 10 } else { (secs / 10) * 10 };
        return format!("updated {}s ago", secs);
    }
    if diff < TimeDelta::hours(1) {
        return format!("updated {}m ago", diff.num_minutes());
    }
    format!("updated {}h ago", diff.num_hours())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_friendly_duration_buckets() {
        assert_eq!(friendly_duration(TimeDelta::seconds(59)), "less than a minute");
        assert_eq!(friendly_duration(TimeDelta::minutes(5)), "5m");
        assert_eq!(friendly_duration(TimeDelta::minutes(59)), "59m");
        assert_eq!(friendly_duration(TimeDelta::hours(2)), "2h");
        assert_eq!(friendly_duration(TimeDelta::minutes(150)), "2h30m");
        assert_eq!(friendly_duration(TimeDelta::days(3)), "3d");
        assert_eq!(
            friendly_duration(TimeDelta::days(3) + TimeDelta::hours(4)),
            "3d 4h"
        );
    }

    #[test]
    fn test_format_reset_future() {
        let now = base();
        let (reset, remaining) = format_reset(now + TimeDelta::minutes(90), now);
        let layout =
            regex::Regex::new(r"^resets at \d{2}:\d{2} [+-]\d{2}:\d{2} [A-Z][a-z]{2} \d{2}$")
                .unwrap();
        assert!(layout.is_match(&reset), "{}", reset);
        assert_eq!(remaining, "1h30m left");
    }

    #[test]
    fn test_format_reset_elapsed() {
        let now = base();
        let (_, remaining) = format_reset(now - TimeDelta::minutes(1), now);
        assert_eq!(remaining, TEXT_RESET_SOON);

        let (_, remaining) = format_reset(now, now);
        assert_eq!(remaining, TEXT_RESET_SOON);
    }

    #[test]
    fn test_human_time() {
        let now = base();
        assert_eq!(human_time(now, now), "updated right now");
        assert_eq!(human_time(now - TimeDelta::seconds(4), now), "updated right now");
        assert_eq!(human_time(now - TimeDelta::seconds(7), now), "updated 10s ago");
        assert_eq!(human_time(now - TimeDelta::seconds(37), now), "updated 30s ago");
        assert_eq!(human_time(now - TimeDelta::minutes(12), now), "updated 12m ago");
        assert_eq!(human_time(now - TimeDelta::hours(3), now), "updated 3h ago");
    }

    #[test]
    fn test_human_time_future_timestamp() {
        // Clock skew can put the update slightly ahead of now
        let now = base();
        assert_eq!(human_time(now + TimeDelta::seconds(3), now), "updated right now");
    }

    proptest! {
        #[test]
        fn prop_past_reset_is_never_negative(secs in 0i64..10_000_000) {
            let now = base();
            let (_, remaining) = format_reset(now - TimeDelta::seconds(secs), now);
            prop_assert_eq!(remaining.as_str(), TEXT_RESET_SOON);
        }
    }
}

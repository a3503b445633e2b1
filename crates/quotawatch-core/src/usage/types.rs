//! Usage data types decoded from the OAuth usage endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{clamp, format_reset};

/// Row label for the 5-hour window
pub const LABEL_CURRENT: &str = "Current";
/// Row label for the 7-day window
pub const LABEL_WEEKLY: &str = "Weekly";

/// A single rolling quota window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUsageWindow")]
pub struct UsageWindow {
    /// Utilization percentage as reported (may be out of range)
    pub utilization: Option<f64>,
    /// When the window rolls over
    pub resets_at: Option<DateTime<Utc>>,
}

/// Wire shape of a window before the reset timestamp is validated
#[derive(Deserialize)]
struct RawUsageWindow {
    #[serde(default)]
    utilization: Option<f64>,
    #[serde(default)]
    resets_at: Option<String>,
}

impl TryFrom<RawUsageWindow> for UsageWindow {
    type Error = String;

    fn try_from(raw: RawUsageWindow) -> Result<Self, Self::Error> {
        let resets_at = match raw.resets_at {
            Some(s) => Some(
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("resets_at parse: {}: {:?}", e, s))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };
        Ok(Self {
            utilization: raw.utilization,
            resets_at,
        })
    }
}

/// Both usage windows from one successful fetch.
///
/// Immutable once decoded; the controller swaps whole snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Rolling 5-hour window
    #[serde(default)]
    pub five_hour: Option<UsageWindow>,
    /// Rolling 7-day window
    #[serde(default)]
    pub seven_day: Option<UsageWindow>,
}

impl UsageSnapshot {
    pub fn five_hour_percent(&self) -> Option<f64> {
        self.five_hour.as_ref().and_then(|w| w.utilization)
    }

    pub fn five_hour_reset(&self) -> Option<DateTime<Utc>> {
        self.five_hour.as_ref().and_then(|w| w.resets_at)
    }

    pub fn seven_day_percent(&self) -> Option<f64> {
        self.seven_day.as_ref().and_then(|w| w.utilization)
    }

    pub fn seven_day_reset(&self) -> Option<DateTime<Utc>> {
        self.seven_day.as_ref().and_then(|w| w.resets_at)
    }

    /// Whether at least one window carries a utilization value
    pub fn has_usable_windows(&self) -> bool {
        self.five_hour_percent().is_some() || self.seven_day_percent().is_some()
    }

    /// Build display rows, skipping windows without utilization
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<UsageRow> {
        [
            (LABEL_CURRENT, self.five_hour.as_ref()),
            (LABEL_WEEKLY, self.seven_day.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, window)| {
            let window = window?;
            let utilization = window.utilization?;
            let (reset, remaining) = window
                .resets_at
                .map(|ts| format_reset(ts, now))
                .unwrap_or_default();
            Some(UsageRow {
                label,
                percent: clamp(utilization, 0.0, 100.0),
                reset,
                remaining,
            })
        })
        .collect()
    }
}

/// One rendered usage bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    /// "Current" or "Weekly"
    pub label: &'static str,
    /// Utilization clamped to 0-100
    pub percent: f64,
    /// e.g. "resets at 14:00 +00:00 Jan 01" (empty when unknown)
    pub reset: String,
    /// e.g. "2h30m left" or "resets soon" (empty when unknown)
    pub remaining: String,
}

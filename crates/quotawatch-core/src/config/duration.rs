//! Human duration strings such as `30s`, `750ms` or `1m30s`.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ConfigError;

/// One `<number><unit>` component
static COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)(ms|s|m|h)").expect("Invalid COMPONENT regex"));

/// Parse a duration such as `5s`, `750ms`, `1.5s` or `1h30m`.
///
/// A bare integer is taken as seconds. Components must cover the whole
/// input; anything else is [`ConfigError::InvalidDuration`].
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: raw.to_string(),
    };
    let text = raw.trim();
    if text.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut covered = 0;
    for caps in COMPONENT.captures_iter(text) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != covered {
            return Err(invalid());
        }
        covered = whole.end();

        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit_secs = match &caps[2] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            _ => 3600.0,
        };
        let part = Duration::try_from_secs_f64(value * unit_secs).map_err(|_| invalid())?;
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    if covered != text.len() {
        return Err(invalid());
    }
    Ok(total)
}

/// Compact rendering for display, e.g. `30s`, `1m30s`, `200ms`
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis());
    }

    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let millis = d.subsec_millis();

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || millis > 0 {
        if millis > 0 {
            let frac = format!("{:03}", millis);
            out.push_str(&format!("{}.{}s", seconds, frac.trim_end_matches('0')));
        } else {
            out.push_str(&format!("{}s", seconds));
        }
    }
    out
}

/// Saturate `value` into the inclusive `[low, high]` range.
///
/// NaN saturates to `low` so a garbage utilization never renders as a full bar.
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() || value < low {
        return low;
    }
    if value > high {
        return high;
    }
    value
}

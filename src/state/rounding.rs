//! Duration to hours conversion

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Billing granularity of the remote service, in steps per hour
const QUARTERS_PER_HOUR: f64 = 4.0;

/// Hours rounded to the nearest quarter hour, half away from zero.
///
/// This is the value booked on stop.
pub fn quarter_hours(elapsed_ms: i64) -> f64 {
    (elapsed_ms as f64 / MS_PER_HOUR * QUARTERS_PER_HOUR).round() / QUARTERS_PER_HOUR
}

/// Hours rounded to two decimals, for live display only
pub fn display_hours(elapsed_ms: i64) -> f64 {
    (elapsed_ms as f64 / MS_PER_HOUR * 100.0).round() / 100.0
}

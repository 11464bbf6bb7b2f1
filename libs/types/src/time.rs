//! Wall-clock timestamps in Unix nanoseconds

use chrono::Utc;

/// Current time as Unix nanos
///
/// Falls back to 0 outside the range representable in an `i64` (year 2262).
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

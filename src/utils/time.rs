use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole seconds between two instants, clamped to `[0, limit]`.
/// Negative deltas (clock skew, backgrounded tab) collapse to 0.
pub fn clamped_elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>, limit: i64) -> i64 {
    (to - from).num_seconds().clamp(0, limit.max(0))
}

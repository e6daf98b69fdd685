use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock timestamp in milliseconds since the Unix epoch.
///
/// Falls back to 0 if the system clock reads earlier than the epoch.
pub fn timestamp_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

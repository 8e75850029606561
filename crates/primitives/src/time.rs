//! Unix-second clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

pub const HOUR_SECS: u64 = 3600;

/// Current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Round a unix timestamp down to the start of its hour.
pub fn truncate_to_hour(ts: u64) -> u64 {
    ts - ts % HOUR_SECS
}

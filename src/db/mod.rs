pub mod models;
pub mod store;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix nanoseconds, the timestamp unit of every table.
pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

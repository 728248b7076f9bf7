//! # Time Utilities
//!
//! Utilities for time handling using chrono.

use chrono::{DateTime, Duration, Utc};

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Unix timestamp (seconds) `validity_secs` from now.
///
/// Used for on-chain style deadlines where contracts compare against block time.
pub fn unix_deadline(validity_secs: u64) -> u64 {
    let validity = Duration::seconds(i64::try_from(validity_secs).unwrap_or(i64::MAX));
    let deadline = now_utc()
        .checked_add_signed(validity)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    deadline.timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_is_ahead_of_now() {
        let now = now_utc().timestamp() as u64;
        let deadline = unix_deadline(600);
        assert!(deadline >= now + 600);
        assert!(deadline <= now + 602);
    }
}

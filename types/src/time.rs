//! Timestamps and the clock seam.
//!
//! Timestamps are Unix epoch seconds (UTC). Proposal expiry is compared
//! against the chain's latest block time, with the local clock as fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Current system time. A clock set before the epoch reads as the epoch.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether a deadline at `self` has been reached at `now`.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        self.0 <= now.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_reached_at_equal_time() {
        let expiry = Timestamp::new(1_700_000_000);
        assert!(expiry.has_passed(Timestamp::new(1_700_000_000)));
        assert!(expiry.has_passed(Timestamp::new(1_700_000_001)));
        assert!(!expiry.has_passed(Timestamp::new(1_699_999_999)));
    }
}

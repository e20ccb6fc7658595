//! Injectable time source.
//!
//! Every expiry computation and check reads the current time through a
//! [`Clock`], so tests can freeze and advance time deterministically.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// A source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as whole seconds since the unix epoch.
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use passlink_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc.timestamp_opt(1_000, 0).unwrap());
/// clock.advance(Duration::seconds(5));
/// assert_eq!(clock.unix_timestamp(), 1_005);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(at),
        }
    }

    /// Create a clock frozen at the current wall-clock time.
    #[must_use]
    pub fn frozen() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write() = at;
    }

    /// Move the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

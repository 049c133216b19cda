//! Store-side clock and monotonic timestamp assignment.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// UTC time source; swappable for deterministic tests.
pub trait Clock: Send + Sync {
    /// Current UTC datetime.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock backed by system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock to `at`, possibly backwards.
    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Assigns non-decreasing, microsecond-precision `created_at` stamps.
pub struct MonotonicStamper {
    clock: Arc<dyn Clock>,
    last: Option<DateTime<Utc>>,
}

impl MonotonicStamper {
    /// Creates a stamper that has issued nothing yet.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    /// Raises the floor to `last`, e.g. the newest persisted stamp.
    pub fn seed(&mut self, last: DateTime<Utc>) {
        self.last = Some(self.last.map_or(last, |cur| cur.max(last)));
    }

    /// Issues the next stamp: `max(now, previous)`.
    pub fn stamp(&mut self) -> DateTime<Utc> {
        let now = truncate_micros(self.clock.now_utc());
        let stamp = self.last.map_or(now, |last| last.max(now));
        self.last = Some(stamp);
        stamp
    }
}

/// Drops sub-microsecond precision so stamps round-trip through integer storage.
pub fn truncate_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn stamps_never_go_backwards() {
        let clock = Arc::new(ManualClock::new(at(100)));
        let mut stamper = MonotonicStamper::new(clock.clone());

        let first = stamper.stamp();
        clock.set(at(50));
        let second = stamper.stamp();
        clock.set(at(200));
        let third = stamper.stamp();

        assert_eq!(first, at(100));
        assert_eq!(second, at(100));
        assert_eq!(third, at(200));
    }

    #[test]
    fn seed_raises_floor() {
        let clock = Arc::new(ManualClock::new(at(10)));
        let mut stamper = MonotonicStamper::new(clock);
        stamper.seed(at(30));
        assert_eq!(stamper.stamp(), at(30));
    }

    #[test]
    fn truncation_drops_nanos() {
        let ts = DateTime::from_timestamp(5, 123_456_789).expect("valid timestamp");
        assert_eq!(truncate_micros(ts).timestamp_subsec_nanos(), 123_456_000);
    }
}

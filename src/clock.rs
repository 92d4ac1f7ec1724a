//! Injectable wall-clock source.
//!
//! Calendar-dependent state (the daily quota date, the per-minute rate
//! buckets) reads time through [`Clock`] so tests can cross bucket and
//! midnight boundaries deterministically. Monotonic waits and expiries use
//! `tokio::time` and are driven by the runtime's paused-time facilities
//! instead.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current UTC wall-clock time.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current UTC calendar date.
    fn today_utc(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }

    /// Current one-minute bucket (unix minutes).
    fn minute_bucket(&self) -> i64 {
        self.now_utc().timestamp() / 60
    }
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock poisoned") = now;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += duration;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

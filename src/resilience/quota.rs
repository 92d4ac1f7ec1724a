//! Persisted daily call counter.
//!
//! A plain `"<date>,<count>"` record on disk, read once at startup and
//! rewritten after each counted call. No cross-process locking: racing
//! writers are accepted for a single active orchestrator instance.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Monotonic (within a UTC day) counter backed by a single file.
#[derive(Debug)]
pub struct DailyQuota {
    path: PathBuf,
    date: NaiveDate,
    count: u32,
}

impl DailyQuota {
    /// Load the stored counter.
    ///
    /// A missing file, an unparsable record, or a stored date other than
    /// `today` all read as a count of 0.
    pub fn load(path: PathBuf, today: NaiveDate) -> Self {
        let count = match fs::read_to_string(&path) {
            Ok(contents) => parse_record(contents.trim(), today).unwrap_or(0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error loading request count");
                0
            }
        };
        Self {
            path,
            date: today,
            count,
        }
    }

    /// Count for `today`, resetting to 0 when the stored date has rolled
    /// over.
    pub fn count(&mut self, today: NaiveDate) -> u32 {
        if self.date != today {
            self.date = today;
            self.count = 0;
        }
        self.count
    }

    /// Increment for `today` and rewrite the record.
    ///
    /// Persistence failures are logged, never propagated: losing the
    /// counter degrades to a more permissive quota, not a broken search.
    pub fn increment(&mut self, today: NaiveDate) {
        self.count(today);
        self.count += 1;
        let record = format!("{},{}", self.date.format(DATE_FORMAT), self.count);
        if let Err(e) = fs::write(&self.path, record) {
            warn!(path = %self.path.display(), error = %e, "error saving request count");
        }
    }
}

fn parse_record(record: &str, today: NaiveDate) -> Option<u32> {
    let (date_str, count_str) = record.split_once(',')?;
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).ok()?;
    if date != today {
        return None;
    }
    count_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut quota = DailyQuota::load(dir.path().join("counter"), day("2024-05-01"));
        assert_eq!(quota.count(day("2024-05-01")), 0);
    }

    #[test]
    fn increment_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter");
        let today = day("2024-05-01");

        let mut quota = DailyQuota::load(path.clone(), today);
        quota.increment(today);
        quota.increment(today);
        assert_eq!(quota.count(today), 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-05-01,2".to_string()
        );

        let mut reloaded = DailyQuota::load(path, today);
        assert_eq!(reloaded.count(today), 2);
    }

    #[test]
    fn stale_date_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter");
        fs::write(&path, "2024-04-30,57").unwrap();

        let mut quota = DailyQuota::load(path, day("2024-05-01"));
        assert_eq!(quota.count(day("2024-05-01")), 0);
    }

    #[test]
    fn malformed_record_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter");
        fs::write(&path, "not a record").unwrap();

        let mut quota = DailyQuota::load(path, day("2024-05-01"));
        assert_eq!(quota.count(day("2024-05-01")), 0);
    }

    #[test]
    fn midnight_rollover_resets_in_memory_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut quota = DailyQuota::load(dir.path().join("counter"), day("2024-05-01"));
        quota.increment(day("2024-05-01"));
        assert_eq!(quota.count(day("2024-05-02")), 0);
        quota.increment(day("2024-05-02"));
        assert_eq!(quota.count(day("2024-05-02")), 1);
    }
}

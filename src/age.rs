/// Age evaluation primitives: newest-write fold and the day-based
/// staleness threshold.
use crate::scan::LogFile;
use chrono::{DateTime, Duration, Local};

/// Most recent modification time across the matched files, or `None` when
/// the match set is empty. Order-independent.
pub fn newest_write(files: &[LogFile]) -> Option<DateTime<Local>> {
    files.iter().map(|f| f.modified).max()
}

/// Elapsed time since the newest write, broken into whole days plus the
/// hour/minute/second remainder.
///
/// A newest write in the future (clock skew) is treated as an age of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAge {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl WriteAge {
    /// Break `now - newest` into day/hour/minute/second components.
    pub fn between(newest: DateTime<Local>, now: DateTime<Local>) -> Self {
        let span = (now - newest).max(Duration::zero());
        Self {
            days: span.num_days(),
            hours: span.num_hours() % 24,
            minutes: span.num_minutes() % 60,
            seconds: span.num_seconds() % 60,
        }
    }

    /// Staleness test: true when at least `limit_days` whole days have
    /// elapsed. The boundary is inclusive, so an age of exactly
    /// `limit_days` triggers.
    pub fn exceeds(&self, limit_days: u32) -> bool {
        self.days >= i64::from(limit_days)
    }
}

impl std::fmt::Display for WriteAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} days, {} hours, {} min, {} sec",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn log_file(modified: DateTime<Local>) -> LogFile {
        LogFile {
            path: PathBuf::from("x_Log.txt"),
            modified,
        }
    }

    #[test]
    fn test_newest_write_empty_set_is_none() {
        assert_eq!(newest_write(&[]), None);
    }

    #[test]
    fn test_newest_write_is_exact_max_regardless_of_order() {
        let now = Local::now();
        let t1 = now - Duration::days(3);
        let t2 = now - Duration::minutes(10);
        let t3 = now - Duration::hours(30);

        // Newest entry deliberately in the middle.
        let files = vec![log_file(t1), log_file(t2), log_file(t3)];
        assert_eq!(newest_write(&files), Some(t2));

        let reversed: Vec<LogFile> = files.into_iter().rev().collect();
        assert_eq!(newest_write(&reversed), Some(t2));
    }

    #[test]
    fn test_breakdown_components() {
        let now = Local::now();
        let newest = now
            - Duration::days(3)
            - Duration::hours(4)
            - Duration::minutes(12)
            - Duration::seconds(9);

        let age = WriteAge::between(newest, now);
        assert_eq!(age.days, 3);
        assert_eq!(age.hours, 4);
        assert_eq!(age.minutes, 12);
        assert_eq!(age.seconds, 9);
        assert_eq!(age.to_string(), "3 days, 4 hours, 12 min, 9 sec");
    }

    #[test]
    fn test_exactly_one_day_triggers_at_limit_one() {
        let now = Local::now();
        let newest = now - Duration::days(1);

        let age = WriteAge::between(newest, now);
        assert_eq!(age.days, 1);
        assert!(age.exceeds(1));
    }

    #[test]
    fn test_one_second_short_of_a_day_does_not_trigger() {
        let now = Local::now();
        let newest = now - Duration::days(1) + Duration::seconds(1);

        let age = WriteAge::between(newest, now);
        assert_eq!(age.days, 0);
        assert_eq!(age.hours, 23);
        assert_eq!(age.minutes, 59);
        assert_eq!(age.seconds, 59);
        assert!(!age.exceeds(1));
    }

    #[test]
    fn test_age_beyond_limit_triggers() {
        let now = Local::now();
        let age = WriteAge::between(now - Duration::days(5), now);
        assert!(age.exceeds(2));
    }

    #[test]
    fn test_future_write_is_clamped_to_zero() {
        let now = Local::now();
        let age = WriteAge::between(now + Duration::hours(6), now);
        assert_eq!(age.days, 0);
        assert_eq!(age.seconds, 0);
        assert!(!age.exceeds(1));
    }

    #[test]
    fn test_zero_limit_always_triggers() {
        let now = Local::now();
        let age = WriteAge::between(now - Duration::seconds(5), now);
        assert!(age.exceeds(0));
    }
}

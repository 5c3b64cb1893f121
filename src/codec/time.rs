use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};

/// 100 ns ticks between 1601-01-01 and 1970-01-01.
const FILE_TIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const TICKS_PER_MICRO: i64 = 10;
const MICROS_PER_SECOND: i64 = 1_000_000;

/// A point in time, as microseconds since the Unix epoch (UTC).
///
/// Every timestamp source (file times, `time_t` seconds, broken-down
/// calendar time, `SystemTime`) lands on this one representation, so equal
/// wall-clock instants compare equal whatever they were produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp(0);

    pub fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    /// Convert a file time: 100 ns ticks since 1601-01-01 UTC.
    ///
    /// Sub-microsecond ticks are truncated toward the earlier instant.
    pub fn from_file_time(ticks: u64) -> Self {
        let since_unix = i128::from(ticks) - i128::from(FILE_TIME_UNIX_EPOCH);
        let micros = since_unix.div_euclid(i128::from(TICKS_PER_MICRO));
        Timestamp(micros as i64)
    }

    pub fn from_unix_seconds(seconds: i64) -> Self {
        Timestamp(seconds.saturating_mul(MICROS_PER_SECOND))
    }

    /// Convert broken-down calendar time, interpreted as UTC.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Timestamp(datetime.and_utc().timestamp_micros())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let datetime: DateTime<Utc> = time.into();
        Timestamp(datetime.timestamp_micros())
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// File time ticks for this instant, `None` before 1601.
    pub fn to_file_time(self) -> Option<u64> {
        let ticks = i128::from(self.0) * i128::from(TICKS_PER_MICRO) + i128::from(FILE_TIME_UNIX_EPOCH);
        u64::try_from(ticks).ok()
    }

    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp_micros(self.0).map(|dt| dt.naive_utc())
    }
}

impl fmt::Display for Timestamp {
    /// `YYYY-MM-DD HH:MM:SS.mmm`, or the raw microsecond count when the
    /// instant is outside the calendar range.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Timestamp::from_system_time(time)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(datetime: NaiveDateTime) -> Self {
        Timestamp::from_datetime(datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_file_time_epoch() {
        assert_eq!(
            Timestamp::from_file_time(FILE_TIME_UNIX_EPOCH as u64),
            Timestamp::UNIX_EPOCH
        );
    }

    #[test]
    fn test_sources_agree() {
        // 2021-03-04 05:06:07.123456 UTC
        let datetime = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_micro_opt(5, 6, 7, 123_456)
            .unwrap();
        let from_calendar = Timestamp::from_datetime(datetime);

        let unix_micros = from_calendar.as_micros();
        let ticks = (unix_micros * 10 + FILE_TIME_UNIX_EPOCH) as u64;
        let from_file_time = Timestamp::from_file_time(ticks);
        assert_eq!(from_calendar, from_file_time);

        let system = UNIX_EPOCH + Duration::from_micros(unix_micros as u64);
        assert_eq!(Timestamp::from_system_time(system), from_calendar);

        let whole_seconds = Timestamp::from_unix_seconds(unix_micros / 1_000_000);
        assert_eq!(whole_seconds.as_micros(), unix_micros - 123_456);
    }

    #[test]
    fn test_file_time_before_unix_epoch() {
        let ts = Timestamp::from_file_time(0);
        assert!(ts.as_micros() < 0);
        assert_eq!(ts.to_file_time(), Some(0));
        assert_eq!(ts.to_string(), "1601-01-01 00:00:00.000");
    }

    #[test]
    fn test_sub_microsecond_ticks_truncate() {
        let base = FILE_TIME_UNIX_EPOCH as u64;
        assert_eq!(Timestamp::from_file_time(base + 9).as_micros(), 0);
        assert_eq!(Timestamp::from_file_time(base + 10).as_micros(), 1);
        assert_eq!(Timestamp::from_file_time(base - 1).as_micros(), -1);
    }

    #[test]
    fn test_display() {
        let datetime = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 7)
            .unwrap();
        assert_eq!(
            Timestamp::from(datetime).to_string(),
            "1999-12-31 23:59:58.007"
        );
    }
}

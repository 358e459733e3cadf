use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock date as entered by the user: `{year, month (1-12), day, hour, minute}`.
///
/// Stored verbatim; only [`CalendarDate::to_local`] turns it into an instant, using the
/// server's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    /// Current local wall-clock time, truncated to the minute.
    pub fn now() -> Self {
        Self::from_local(&Local::now())
    }

    pub fn from_local(instant: &DateTime<Local>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
        }
    }

    /// Naive wall-clock time. Out-of-range day, hour and minute values roll over into the
    /// next unit (day 31 of April is May 1st), so any record accepted by validation maps to
    /// a time. `None` only for a month outside 1-12 or an unrepresentable year.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let first_of_month = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let midnight = first_of_month.and_hms_opt(0, 0, 0)?;
        midnight
            .checked_add_signed(Duration::days(i64::from(self.day) - 1))?
            .checked_add_signed(Duration::hours(i64::from(self.hour)))?
            .checked_add_signed(Duration::minutes(i64::from(self.minute)))
    }

    /// Instant this date denotes in the server's local zone.
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        let naive = self.to_naive()?;
        // A DST gap has no local mapping; read the wall clock as UTC-offset time instead.
        Local
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| Some(Local.from_utc_datetime(&naive)))
    }

    /// True when the date falls in the same local hour as `now` and its minute lies within
    /// `window` minutes of `now`'s minute.
    pub fn matches_sweep_window(&self, now: &CalendarDate, window: u32) -> bool {
        self.year == now.year
            && self.month == now.month
            && self.day == now.day
            && self.hour == now.hour
            && self.minute + window >= now.minute
            && self.minute <= now.minute + window
    }
}

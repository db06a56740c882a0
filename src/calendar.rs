//! Local calendar arithmetic for hit bucketing
//!
//! Every hit stores the day, month and year of its timestamp as seen in the
//! service time zone. The helpers here derive those parts and perform the
//! month arithmetic used by the "last month" and sparkline queries.

use chrono::{DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Day, month and year of an instant in the service calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarParts {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

impl CalendarParts {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day() as i32,
            month: date.month() as i32,
            year: date.year(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn parts(&self, instant: DateTime<Utc>) -> CalendarParts {
        CalendarParts::from_date(self.local_date(instant))
    }

    /// Calendar month preceding the one containing `instant`.
    ///
    /// The reference date is clamped to the last valid day of the previous
    /// month, so March 31st maps to February and never rolls back into March.
    pub fn previous_month(&self, instant: DateTime<Utc>) -> CalendarParts {
        let today = self.local_date(instant);
        let previous = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        CalendarParts::from_date(previous)
    }

    /// The instant `months` calendar months before `instant`, computed on the
    /// local wall clock with the same day clamping as [`Self::previous_month`].
    pub fn months_before(&self, instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
        let local = instant.with_timezone(&self.tz);
        let Some(shifted) = local.naive_local().checked_sub_months(Months::new(months)) else {
            return DateTime::<Utc>::MIN_UTC;
        };

        match self.tz.from_local_datetime(&shifted) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // Wall-clock time skipped by a DST transition: keep the current offset
            LocalResult::None => {
                let offset = i64::from(local.offset().fix().local_minus_utc());
                Utc.from_utc_datetime(&(shifted - Duration::seconds(offset)))
            }
        }
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parts_follow_configured_timezone() {
        let instant = utc(2024, 1, 31, 23, 30);

        let parts = Calendar::utc().parts(instant);
        assert_eq!((parts.day, parts.month, parts.year), (31, 1, 2024));

        let amsterdam = Calendar::new(Tz::Europe__Amsterdam).parts(instant);
        assert_eq!((amsterdam.day, amsterdam.month, amsterdam.year), (1, 2, 2024));
    }

    #[test]
    fn test_previous_month_clamps_to_short_month() {
        let calendar = Calendar::utc();

        let parts = calendar.previous_month(utc(2024, 3, 31, 12, 0));
        assert_eq!((parts.month, parts.year), (2, 2024));

        let parts = calendar.previous_month(utc(2023, 5, 31, 12, 0));
        assert_eq!((parts.month, parts.year), (4, 2023));
    }

    #[test]
    fn test_previous_month_crosses_year() {
        let parts = Calendar::utc().previous_month(utc(2024, 1, 15, 0, 0));
        assert_eq!((parts.month, parts.year), (12, 2023));
    }

    #[test]
    fn test_months_before() {
        let calendar = Calendar::utc();
        assert_eq!(
            calendar.months_before(utc(2024, 3, 15, 10, 0), 1),
            utc(2024, 2, 15, 10, 0)
        );
        assert_eq!(
            calendar.months_before(utc(2024, 3, 31, 10, 0), 1),
            utc(2024, 2, 29, 10, 0)
        );
    }

    #[test]
    fn test_months_before_keeps_local_wall_clock() {
        // 09:00 in Amsterdam is 08:00Z in winter and 07:00Z in summer
        let calendar = Calendar::new(Tz::Europe__Amsterdam);
        assert_eq!(
            calendar.months_before(utc(2024, 4, 15, 7, 0), 1),
            utc(2024, 3, 15, 8, 0)
        );
    }
}

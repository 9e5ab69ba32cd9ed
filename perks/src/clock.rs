//! Service-day arithmetic.
//!
//! A service day is a venue-local calendar day whose boundary is shifted by
//! `offset_hours`: with an offset of 3, a job at 02:30 belongs to the previous
//! day and the day rolls over at 03:00. Boundaries are computed on local wall
//! time and converted to UTC independently, so DST days stay 23 or 25 hours.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

/// Identifier of a service day: the venue-local date it is named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ServiceDay(NaiveDate);

impl ServiceDay {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The service day `days` later.
    pub fn plus_days(&self, days: u32) -> Self {
        Self(
            self.0
                .checked_add_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    pub fn next(&self) -> Self {
        self.plus_days(1)
    }

    /// First service day of the same month.
    pub fn first_of_month(&self) -> Self {
        Self(self.0.with_day(1).unwrap_or(self.0))
    }

    /// First service day of the following month.
    pub fn first_of_next_month(&self) -> Self {
        let first = self.first_of_month().0;
        Self(
            first
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX),
        )
    }
}

impl fmt::Display for ServiceDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Half-open `[start, end)` range covering one service month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceMonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ServiceMonthWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Last instant inside the window.
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.end - Duration::milliseconds(1)
    }
}

/// Converts instants to service days for one venue timezone and offset.
///
/// The offset is not range-checked here; [`crate::PerksConfig::validate`]
/// rejects values outside [-12, 12].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDayClock {
    offset_hours: i32,
    timezone: Tz,
}

impl ServiceDayClock {
    pub fn new(offset_hours: i32, timezone: Tz) -> Self {
        Self {
            offset_hours,
            timezone,
        }
    }

    /// A clock on UTC calendar days.
    pub fn utc(offset_hours: i32) -> Self {
        Self::new(offset_hours, Tz::UTC)
    }

    pub fn offset_hours(&self) -> i32 {
        self.offset_hours
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn offset(&self) -> Duration {
        Duration::hours(i64::from(self.offset_hours))
    }

    /// The service day an instant belongs to.
    pub fn service_day(&self, instant: DateTime<Utc>) -> ServiceDay {
        let local = instant.with_timezone(&self.timezone).naive_local();
        let shifted = local.checked_sub_signed(self.offset()).unwrap_or(local);
        ServiceDay(shifted.date())
    }

    /// First instant of a service day. Saturates at the ends of the
    /// representable range.
    pub fn day_start(&self, day: ServiceDay) -> DateTime<Utc> {
        match day.date().and_time(NaiveTime::MIN).checked_add_signed(self.offset()) {
            Some(boundary) => self.resolve_local(boundary),
            None if self.offset_hours < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Last instant of a service day.
    pub fn day_end(&self, day: ServiceDay) -> DateTime<Utc> {
        self.day_start(day.next()) - Duration::milliseconds(1)
    }

    /// Start of the service day containing `instant`.
    pub fn start_of_service_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.day_start(self.service_day(instant))
    }

    /// The service month containing `reference`.
    pub fn service_month_window(&self, reference: DateTime<Utc>) -> ServiceMonthWindow {
        let day = self.service_day(reference);
        ServiceMonthWindow {
            start: self.day_start(day.first_of_month()),
            end: self.day_start(day.first_of_next_month()),
        }
    }

    /// Map a local wall-clock time to UTC. Ambiguous times take the earlier
    /// instant; times inside a DST gap move past the gap.
    fn resolve_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let resolved = match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(t) => Some(t),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => local
                .checked_add_signed(Duration::hours(1))
                .and_then(|later| self.timezone.from_local_datetime(&later).earliest()),
        };

        match resolved {
            Some(t) => t.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> ServiceDay {
        ServiceDay::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_zero_offset_is_calendar_day() {
        let clock = ServiceDayClock::utc(0);
        assert_eq!(clock.service_day(utc(2025, 3, 8, 23, 59, 59)), day(2025, 3, 8));
        assert_eq!(clock.service_day(utc(2025, 3, 9, 0, 0, 0)), day(2025, 3, 9));
    }

    #[test]
    fn test_offset_boundary() {
        let clock = ServiceDayClock::utc(3);
        assert_eq!(clock.service_day(utc(2025, 3, 9, 2, 59, 59)), day(2025, 3, 8));
        assert_eq!(clock.service_day(utc(2025, 3, 9, 3, 0, 0)), day(2025, 3, 9));
        assert_eq!(clock.day_start(day(2025, 3, 9)), utc(2025, 3, 9, 3, 0, 0));
        assert_eq!(
            clock.day_end(day(2025, 3, 8)),
            utc(2025, 3, 9, 3, 0, 0) - Duration::milliseconds(1)
        );
    }

    #[test]
    fn test_negative_offset() {
        let clock = ServiceDayClock::utc(-2);
        assert_eq!(clock.service_day(utc(2025, 3, 8, 21, 59, 59)), day(2025, 3, 8));
        assert_eq!(clock.service_day(utc(2025, 3, 8, 22, 0, 0)), day(2025, 3, 9));
    }

    #[test]
    fn test_month_window_with_offset() {
        let clock = ServiceDayClock::utc(3);
        // 1 April 01:00 still belongs to the last service day of March
        let window = clock.service_month_window(utc(2025, 4, 1, 1, 0, 0));
        assert_eq!(window.start, utc(2025, 3, 1, 3, 0, 0));
        assert_eq!(window.end, utc(2025, 4, 1, 3, 0, 0));
        assert!(window.contains(utc(2025, 4, 1, 2, 59, 59)));
        assert!(!window.contains(utc(2025, 4, 1, 3, 0, 0)));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let window = ServiceDayClock::utc(0).service_month_window(utc(2024, 12, 15, 12, 0, 0));
        assert_eq!(window.end, utc(2025, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_venue_timezone_day_boundary() {
        let clock = ServiceDayClock::new(3, chrono_tz::Europe::Zurich);
        // 01:30 UTC on 9 March is 02:30 in Zurich (CET), before the 03:00 rollover
        assert_eq!(clock.service_day(utc(2025, 3, 9, 1, 30, 0)), day(2025, 3, 8));
        assert_eq!(clock.day_start(day(2025, 3, 9)), utc(2025, 3, 9, 2, 0, 0));
    }

    #[test]
    fn test_last_representable_day_saturates() {
        let clock = ServiceDayClock::utc(3);
        let last = ServiceDay::from_date(NaiveDate::MAX);
        let expected = NaiveDate::MAX.and_hms_opt(3, 0, 0).unwrap().and_utc();
        assert_eq!(last.plus_days(10), last);
        assert_eq!(clock.day_start(last.plus_days(10)), expected);
    }

    #[test]
    fn test_dst_short_day() {
        let clock = ServiceDayClock::new(0, chrono_tz::Europe::Zurich);
        // Clocks jump from 02:00 to 03:00 on 30 March 2025
        let start = clock.day_start(day(2025, 3, 30));
        let end = clock.day_start(day(2025, 3, 31));
        assert_eq!(end - start, Duration::hours(23));
    }
}

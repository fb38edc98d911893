//! Weekly recurrence arithmetic in a fixed civil timezone.
//!
//! Every function takes `now` explicitly and reads no hidden state, so the
//! same clock can serve the member view, the admin view and tests. All
//! wall-clock math happens on the civil (naive local) time; daylight-saving
//! transitions are not special-cased.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use friday_core::CycleKey;

use crate::window::{TimeOfDay, WindowConfig};

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;

/// Recurrence of one weekday in one civil timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceClock {
    tz: Tz,
    target: Weekday,
}

impl RecurrenceClock {
    pub fn new(tz: Tz, target: Weekday) -> Self {
        Self { tz, target }
    }

    /// The production clock: ordering happens on Fridays.
    pub fn friday(tz: Tz) -> Self {
        Self::new(tz, Weekday::Fri)
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn target(&self) -> Weekday {
        self.target
    }

    /// `now` in the clock's civil timezone.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.tz)
    }

    /// Date of the current cycle: today if today is the target weekday,
    /// otherwise the next target weekday.
    pub fn current_cycle_key(&self, now: DateTime<Utc>) -> CycleKey {
        let local = self.local(now);
        let ahead = self.days_until_target(local.weekday());
        CycleKey::new(local.date_naive() + Duration::days(ahead))
    }

    /// Whether `now` falls inside the window on a target day. Both bounds count as open.
    pub fn is_window_open(&self, now: DateTime<Utc>, window: &WindowConfig) -> bool {
        let local = self.local(now);
        local.weekday() == self.target && window.contains_minute(minute_of_day(&local))
    }

    /// Civil wall-clock time at which the window next opens.
    ///
    /// On a target day before `start` that is today; at or after `start`
    /// (inside the window included) it is a week later.
    pub fn next_window_start(&self, now: DateTime<Utc>, window: &WindowConfig) -> NaiveDateTime {
        let local = self.local(now);
        let days = if local.weekday() == self.target {
            if minute_of_day(&local) < window.start().minutes_since_midnight() {
                0
            } else {
                7
            }
        } else {
            self.days_until_target(local.weekday())
        };

        (local.date_naive() + Duration::days(days)).and_time(naive_time(window.start()))
    }

    /// Time left until [`next_window_start`](Self::next_window_start), floored to whole minutes.
    pub fn time_until_next_window(&self, now: DateTime<Utc>, window: &WindowConfig) -> Countdown {
        let from = self.local(now).naive_local();
        Countdown::from_duration(self.next_window_start(now, window) - from)
    }

    fn days_until_target(&self, dow: Weekday) -> i64 {
        let target = i64::from(self.target.num_days_from_sunday());
        let dow = i64::from(dow.num_days_from_sunday());
        (target - dow + 7) % 7
    }
}

fn minute_of_day<T: Timelike>(t: &T) -> u32 {
    t.hour() * 60 + t.minute()
}

fn naive_time(t: TimeOfDay) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or_default()
}

/// Whole days, hours and minutes until an instant, each unit floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl Countdown {
    /// Negative durations clamp to zero.
    pub fn from_duration(d: Duration) -> Self {
        let secs = d.num_seconds().max(0);
        Self {
            days: (secs / SECS_PER_DAY) as u32,
            hours: ((secs % SECS_PER_DAY) / SECS_PER_HOUR) as u32,
            minutes: ((secs % SECS_PER_HOUR) / 60) as u32,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        u64::from(self.days) * 24 * 60 + u64::from(self.hours) * 60 + u64::from(self.minutes)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m", self.hours, self.minutes)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Europe::Tirane;

    fn clock() -> RecurrenceClock {
        RecurrenceClock::friday(Tirane)
    }

    /// Instant for a Tirane wall-clock time.
    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Tirane
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("unambiguous local time")
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-16 is a Friday.

    #[test]
    fn test_cycle_key_on_friday_is_today() {
        let c = clock();
        assert_eq!(c.current_cycle_key(at(2026, 10, 16, 0, 0)).date(), date(2026, 10, 16));
        assert_eq!(c.current_cycle_key(at(2026, 10, 16, 23, 59)).date(), date(2026, 10, 16));
    }

    #[test]
    fn test_cycle_key_before_friday_is_this_week() {
        let c = clock();
        assert_eq!(c.current_cycle_key(at(2026, 10, 12, 10, 0)).date(), date(2026, 10, 16));
        assert_eq!(c.current_cycle_key(at(2026, 10, 15, 23, 59)).date(), date(2026, 10, 16));
    }

    #[test]
    fn test_cycle_key_on_weekend_is_next_friday() {
        let c = clock();
        assert_eq!(c.current_cycle_key(at(2026, 10, 17, 8, 0)).date(), date(2026, 10, 23));
        assert_eq!(c.current_cycle_key(at(2026, 10, 18, 20, 0)).date(), date(2026, 10, 23));
    }

    #[test]
    fn test_cycle_key_uses_civil_date_not_utc() {
        // 23:30 UTC Thursday is already Friday 01:30 in Tirane (UTC+2).
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 23, 30, 0).unwrap();
        assert_eq!(clock().current_cycle_key(now).date(), date(2026, 10, 16));
        assert!(clock().is_window_open(at(2026, 10, 16, 9, 0), &WindowConfig::DEFAULT));
    }

    #[test]
    fn test_cycle_key_always_target_and_never_past() {
        let c = clock();
        let start = at(2026, 3, 1, 0, 0);
        for hour in 0..(24 * 21) {
            let now = start + Duration::hours(hour) + Duration::minutes(17);
            let key = c.current_cycle_key(now);
            assert_eq!(key.date().weekday(), Weekday::Fri, "at {now}");
            assert!(key.date() >= c.local(now).date_naive(), "at {now}");
            assert!(key.date() - c.local(now).date_naive() < Duration::days(7));
        }
    }

    #[test]
    fn test_window_closed_on_other_days() {
        let c = clock();
        let wide = WindowConfig::parse("00:00", "23:59").unwrap();
        for day in [12, 13, 14, 15, 17, 18] {
            assert!(!c.is_window_open(at(2026, 10, day, 10, 0), &wide));
            assert!(!c.is_window_open(at(2026, 10, day, 10, 0), &WindowConfig::DEFAULT));
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let c = clock();
        let w = WindowConfig::parse("09:00", "12:30").unwrap();
        assert!(!c.is_window_open(at(2026, 10, 16, 8, 59), &w));
        assert!(c.is_window_open(at(2026, 10, 16, 9, 0), &w));
        assert!(c.is_window_open(at(2026, 10, 16, 10, 45), &w));
        assert!(c.is_window_open(at(2026, 10, 16, 12, 30), &w));
        assert!(!c.is_window_open(at(2026, 10, 16, 12, 31), &w));
    }

    #[test]
    fn test_closing_minute_counts_until_it_ends() {
        let c = clock();
        let late = at(2026, 10, 16, 12, 30) + Duration::seconds(59);
        assert!(c.is_window_open(late, &WindowConfig::DEFAULT));
    }

    #[test]
    fn test_countdown_friday_before_start() {
        let c = clock();
        let cd = c.time_until_next_window(at(2026, 10, 16, 8, 0), &WindowConfig::DEFAULT);
        assert_eq!(cd.total_minutes(), 60);
        assert_eq!(cd, Countdown { days: 0, hours: 1, minutes: 0 });
        assert_eq!(cd.to_string(), "1h 0m");
    }

    #[test]
    fn test_countdown_friday_after_window_is_next_week() {
        let c = clock();
        let now = at(2026, 10, 16, 13, 0);
        assert_eq!(
            c.next_window_start(now, &WindowConfig::DEFAULT),
            date(2026, 10, 23).and_hms_opt(9, 0, 0).unwrap()
        );
        let cd = c.time_until_next_window(now, &WindowConfig::DEFAULT);
        assert_eq!(cd, Countdown { days: 6, hours: 20, minutes: 0 });
        assert_eq!(cd.total_minutes(), 7 * 24 * 60 - 4 * 60);
    }

    #[test]
    fn test_countdown_inside_window_targets_next_week() {
        let c = clock();
        let now = at(2026, 10, 16, 9, 0);
        assert_eq!(
            c.next_window_start(now, &WindowConfig::DEFAULT),
            date(2026, 10, 23).and_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(c.time_until_next_window(now, &WindowConfig::DEFAULT).days, 7);
    }

    #[test]
    fn test_countdown_from_weekday() {
        let c = clock();
        let cd = c.time_until_next_window(at(2026, 10, 14, 18, 45), &WindowConfig::DEFAULT);
        assert_eq!(cd, Countdown { days: 1, hours: 14, minutes: 15 });
        assert_eq!(cd.to_string(), "1d 14h 15m");
    }

    #[test]
    fn test_countdown_floors_seconds() {
        let c = clock();
        let now = at(2026, 10, 16, 8, 58) + Duration::seconds(30);
        let cd = c.time_until_next_window(now, &WindowConfig::DEFAULT);
        assert_eq!(cd, Countdown { days: 0, hours: 0, minutes: 1 });
        assert_eq!(cd.to_string(), "1m");
    }

    #[test]
    fn test_countdown_respects_custom_start() {
        let c = clock();
        let w = WindowConfig::parse("11:15", "13:00").unwrap();
        let cd = c.time_until_next_window(at(2026, 10, 16, 10, 0), &w);
        assert_eq!(cd, Countdown { days: 0, hours: 1, minutes: 15 });
    }

    #[test]
    fn test_countdown_negative_clamps() {
        assert_eq!(
            Countdown::from_duration(Duration::minutes(-5)),
            Countdown { days: 0, hours: 0, minutes: 0 }
        );
    }

    #[test]
    fn test_other_target_weekday() {
        let c = RecurrenceClock::new(Tirane, Weekday::Mon);
        assert_eq!(c.current_cycle_key(at(2026, 10, 16, 10, 0)).date(), date(2026, 10, 19));
        assert!(c.is_window_open(at(2026, 10, 19, 10, 0), &WindowConfig::DEFAULT));
    }
}

//! Anchored fortnightly accounting windows.
//!
//! A cycle is the half-open interval `[start, end)` between two local
//! midnights fourteen calendar days apart. Cycles are aligned to an anchor
//! date, so the same instant always maps to the same cycle for a given
//! anchor and timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

pub const CYCLE_LENGTH_DAYS: i64 = 14;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// The anchor used when none has been configured: 2025-01-01.
pub fn default_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Resolves an IANA zone identifier such as `Europe/Paris`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| LedgerError::InvalidTimezone(name.to_string()))
}

/// One accounting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cycle {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Local calendar date of `start`; identifies the cycle.
    pub first_day: NaiveDate,
}

impl Cycle {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days(CYCLE_LENGTH_DAYS - 1)
    }
}

/// Maps instants onto cycles for a fixed anchor and timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleClock {
    anchor: NaiveDate,
    tz: Tz,
}

impl Default for CycleClock {
    fn default() -> Self {
        Self::new(default_anchor(), DEFAULT_TIMEZONE)
    }
}

impl CycleClock {
    pub fn new(anchor: NaiveDate, tz: Tz) -> Self {
        Self { anchor, tz }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The cycle containing `now`.
    pub fn cycle_at(&self, now: DateTime<Utc>) -> Cycle {
        let today = self.day_of(now);
        let days_diff = (today - self.anchor).num_days();
        let offset = days_diff.div_euclid(CYCLE_LENGTH_DAYS) * CYCLE_LENGTH_DAYS;
        self.cycle_from(self.anchor + Duration::days(offset))
    }

    pub fn next(&self, cycle: &Cycle) -> Cycle {
        self.cycle_from(cycle.first_day + Duration::days(CYCLE_LENGTH_DAYS))
    }

    pub fn previous(&self, cycle: &Cycle) -> Cycle {
        self.cycle_from(cycle.first_day - Duration::days(CYCLE_LENGTH_DAYS))
    }

    /// The fourteen local calendar days covered by `cycle`, in order.
    pub fn days(&self, cycle: &Cycle) -> Vec<NaiveDate> {
        (0..CYCLE_LENGTH_DAYS)
            .map(|offset| cycle.first_day + Duration::days(offset))
            .collect()
    }

    /// Local calendar date of an instant.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Midday on `day` in the clock's timezone.
    pub fn local_noon(&self, day: NaiveDate) -> DateTime<Utc> {
        day.and_hms_opt(12, 0, 0)
            .and_then(|noon| self.tz.from_local_datetime(&noon).earliest())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| local_midnight(day, self.tz) + Duration::hours(12))
    }

    /// Renders `Jan 1–Jan 14` style labels using the last included day.
    pub fn format_range(&self, cycle: &Cycle) -> String {
        format_range(cycle, self.tz)
    }

    fn cycle_from(&self, first_day: NaiveDate) -> Cycle {
        Cycle {
            start: local_midnight(first_day, self.tz),
            end: local_midnight(first_day + Duration::days(CYCLE_LENGTH_DAYS), self.tz),
            first_day,
        }
    }
}

/// Computes the cycle containing `now` for the given anchor and timezone.
pub fn compute_cycle(now: DateTime<Utc>, anchor: NaiveDate, tz: Tz) -> Cycle {
    CycleClock::new(anchor, tz).cycle_at(now)
}

pub fn format_range(cycle: &Cycle, tz: Tz) -> String {
    let start = cycle.start.with_timezone(&tz).date_naive();
    let last = cycle.end.with_timezone(&tz).date_naive() - Duration::days(1);
    format!("{}–{}", start.format("%b %-d"), last.format("%b %-d"))
}

/// The first instant of `date` in `tz`.
///
/// Where midnight falls inside a DST gap the first existing local time of
/// that day is used.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hour| {
            tz.from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paris(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        DEFAULT_TIMEZONE
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn anchor_day_starts_the_anchor_cycle() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2025, 1, 1, 0));
        assert_eq!(cycle.first_day, date(2025, 1, 1));
        assert_eq!(cycle.start, Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap());
        assert_eq!(cycle.end, Utc.with_ymd_and_hms(2025, 1, 14, 23, 0, 0).unwrap());
    }

    #[test]
    fn day_before_anchor_resolves_to_preceding_cycle() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2024, 12, 31, 12));
        assert_eq!(cycle.first_day, date(2024, 12, 18));
        assert_eq!(cycle.end, local_midnight(date(2025, 1, 1), DEFAULT_TIMEZONE));
    }

    #[test]
    fn late_evening_utc_uses_local_calendar_day() {
        let clock = CycleClock::default();
        // 23:30 UTC on Jan 14 is already Jan 15 in Paris.
        let at = Utc.with_ymd_and_hms(2025, 1, 14, 23, 30, 0).unwrap();
        assert_eq!(clock.cycle_at(at).first_day, date(2025, 1, 15));
    }

    #[test]
    fn end_instant_belongs_to_next_cycle() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2025, 1, 5, 9));
        assert!(!cycle.contains(cycle.end));
        assert!(cycle.contains(cycle.start));
        assert_eq!(clock.cycle_at(cycle.end), clock.next(&cycle));
    }

    #[test]
    fn utc_windows_are_exactly_fourteen_days() {
        let clock = CycleClock::new(date(2025, 1, 1), chrono_tz::UTC);
        for offset in -60..60 {
            let now = Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap() + Duration::days(offset);
            let cycle = clock.cycle_at(now);
            assert_eq!(cycle.end - cycle.start, Duration::days(CYCLE_LENGTH_DAYS));
            assert!(cycle.contains(now));
        }
    }

    #[test]
    fn dst_cycle_keeps_local_midnight_boundaries() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2025, 3, 30, 12));
        assert_eq!(cycle.first_day, date(2025, 3, 26));
        assert_eq!(cycle.start, Utc.with_ymd_and_hms(2025, 3, 25, 23, 0, 0).unwrap());
        assert_eq!(cycle.end, Utc.with_ymd_and_hms(2025, 4, 8, 22, 0, 0).unwrap());
        assert_eq!(cycle.end - cycle.start, Duration::days(14) - Duration::hours(1));
    }

    #[test]
    fn midnight_inside_dst_gap_uses_first_valid_hour() {
        let santiago = chrono_tz::America::Santiago;
        let start = local_midnight(date(2024, 9, 8), santiago).with_timezone(&santiago);
        assert_eq!(start.date_naive(), date(2024, 9, 8));
        assert_eq!(start.hour(), 1);
    }

    #[test]
    fn local_noon_is_twelve_on_dst_days() {
        let clock = CycleClock::default();
        let spring = clock.local_noon(date(2025, 3, 30));
        assert_eq!(spring, Utc.with_ymd_and_hms(2025, 3, 30, 10, 0, 0).unwrap());
        let autumn = clock.local_noon(date(2025, 10, 26));
        assert_eq!(autumn.with_timezone(&DEFAULT_TIMEZONE).hour(), 12);
        assert_eq!(autumn, Utc.with_ymd_and_hms(2025, 10, 26, 11, 0, 0).unwrap());
    }

    #[test]
    fn days_lists_the_whole_window() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2025, 1, 20, 8));
        let days = clock.days(&cycle);
        assert_eq!(days.len(), 14);
        assert_eq!(days[0], date(2025, 1, 15));
        assert_eq!(*days.last().unwrap(), cycle.last_day());
    }

    #[test]
    fn format_range_uses_last_included_day() {
        let clock = CycleClock::default();
        let cycle = clock.cycle_at(paris(2025, 1, 3, 10));
        insta::assert_snapshot!(clock.format_range(&cycle), @"Jan 1–Jan 14");
    }

    #[test]
    fn parse_timezone_rejects_unknown_names() {
        assert_eq!(parse_timezone("Europe/Paris").unwrap(), DEFAULT_TIMEZONE);
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(LedgerError::InvalidTimezone(_))
        ));
    }
}

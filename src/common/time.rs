use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

use crate::error::{SeriesError, SeriesResult};

/// A point on the time axis of a series.
///
/// Measurement times only need a total order and span arithmetic: the
/// engine never assumes a fixed resolution or an origin. Implemented for
/// `i64`, `f64` and `DateTime<Utc>`, which covers integral, real and
/// wall-clock domains.
pub trait TimePoint: Copy + PartialOrd + Debug {
    /// The difference between two points (`i64`, `f64`, or a `chrono`
    /// duration for wall-clock time).
    type Span: Copy + PartialOrd + Debug;

    /// Total order over points. Float keys are ordered with
    /// `f64::total_cmp` so that a series cannot be wedged by a NaN key.
    fn cmp_points(&self, other: &Self) -> Ordering;

    fn add_span(self, span: Self::Span) -> Self;
    fn sub_span(self, span: Self::Span) -> Self;

    /// `end - start`.
    fn span_between(start: Self, end: Self) -> Self::Span;

    /// Span expressed in seconds for wall-clock time, raw units otherwise.
    /// This is the weight used by duration-weighted aggregation.
    fn span_units(span: Self::Span) -> f64;

    fn half_span(span: Self::Span) -> Self::Span;

    fn zero_span() -> Self::Span;

    fn midpoint(start: Self, end: Self) -> Self {
        start.add_span(Self::half_span(Self::span_between(start, end)))
    }

    /// Fraction of the way from `start` to `end` at which `at` lies.
    fn fraction(start: Self, end: Self, at: Self) -> f64 {
        Self::span_units(Self::span_between(start, at))
            / Self::span_units(Self::span_between(start, end))
    }
}

impl TimePoint for i64 {
    type Span = i64;

    fn cmp_points(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn add_span(self, span: i64) -> Self {
        self + span
    }

    fn sub_span(self, span: i64) -> Self {
        self - span
    }

    fn span_between(start: Self, end: Self) -> i64 {
        end - start
    }

    fn span_units(span: i64) -> f64 {
        span as f64
    }

    fn half_span(span: i64) -> i64 {
        span / 2
    }

    fn zero_span() -> i64 {
        0
    }
}

impl TimePoint for f64 {
    type Span = f64;

    fn cmp_points(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn add_span(self, span: f64) -> Self {
        self + span
    }

    fn sub_span(self, span: f64) -> Self {
        self - span
    }

    fn span_between(start: Self, end: Self) -> f64 {
        end - start
    }

    fn span_units(span: f64) -> f64 {
        span
    }

    fn half_span(span: f64) -> f64 {
        span / 2.0
    }

    fn zero_span() -> f64 {
        0.0
    }
}

impl TimePoint for DateTime<Utc> {
    type Span = Duration;

    fn cmp_points(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn add_span(self, span: Duration) -> Self {
        self + span
    }

    fn sub_span(self, span: Duration) -> Self {
        self - span
    }

    fn span_between(start: Self, end: Self) -> Duration {
        end - start
    }

    fn span_units(span: Duration) -> f64 {
        match span.num_microseconds() {
            Some(us) => us as f64 / 1e6,
            None => span.num_milliseconds() as f64 / 1e3,
        }
    }

    fn half_span(span: Duration) -> Duration {
        span / 2
    }

    fn zero_span() -> Duration {
        Duration::zero()
    }
}

/// Calendar units accepted by binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl FromStr for DurationUnit {
    type Err = SeriesError;

    fn from_str(s: &str) -> SeriesResult<Self> {
        match s {
            "years" => Ok(DurationUnit::Years),
            "months" => Ok(DurationUnit::Months),
            "weeks" => Ok(DurationUnit::Weeks),
            "days" => Ok(DurationUnit::Days),
            "hours" => Ok(DurationUnit::Hours),
            "minutes" => Ok(DurationUnit::Minutes),
            "seconds" => Ok(DurationUnit::Seconds),
            other => Err(SeriesError::bad_argument(format!(
                "unsupported duration unit '{other}'"
            ))),
        }
    }
}

/// Time points that carry a calendar, so bins can be floored to month or
/// week boundaries. Only wall-clock time implements this.
pub trait CalendarPoint: TimePoint {
    /// Round down to the nearest `n_units` multiple of `unit` within its
    /// natural cycle: month numbers modulo `n_units`, week-of-year modulo
    /// `n_units`, and so on.
    fn floor_to(self, unit: DurationUnit, n_units: u32) -> SeriesResult<Self>;

    /// Advance by `n_units` of `unit`, calendar-aware for months/years.
    fn step_by(self, unit: DurationUnit, n_units: u32) -> SeriesResult<Self>;
}

fn ymd_hms(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> SeriesResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            SeriesError::bad_argument(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid time"
            ))
        })
}

impl CalendarPoint for DateTime<Utc> {
    fn floor_to(self, unit: DurationUnit, n_units: u32) -> SeriesResult<Self> {
        if n_units == 0 {
            return Err(SeriesError::bad_argument("n_units must be positive"));
        }
        let n = n_units;
        match unit {
            DurationUnit::Years => {
                let year = self.year() - (self.year() - 1).rem_euclid(n as i32);
                ymd_hms(year, 1, 1, 0, 0, 0)
            }
            DurationUnit::Months => {
                let month = self.month() - (self.month() - 1) % n;
                ymd_hms(self.year(), month, 1, 0, 0, 0)
            }
            DurationUnit::Weeks => {
                let iso = self.iso_week();
                let week = iso.week() - (iso.week() - 1) % n;
                NaiveDate::from_isoywd_opt(iso.year(), week, chrono::Weekday::Mon)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| {
                        SeriesError::bad_argument(format!(
                            "week {week} of {} is not a valid ISO week",
                            iso.year()
                        ))
                    })
            }
            DurationUnit::Days => {
                let day = self.day() - self.day() % n;
                ymd_hms(self.year(), self.month(), day, 0, 0, 0)
            }
            DurationUnit::Hours => {
                let hour = self.hour() - self.hour() % n;
                ymd_hms(self.year(), self.month(), self.day(), hour, 0, 0)
            }
            DurationUnit::Minutes => {
                let minute = self.minute() - self.minute() % n;
                ymd_hms(
                    self.year(),
                    self.month(),
                    self.day(),
                    self.hour(),
                    minute,
                    0,
                )
            }
            DurationUnit::Seconds => {
                let second = self.second() - self.second() % n;
                ymd_hms(
                    self.year(),
                    self.month(),
                    self.day(),
                    self.hour(),
                    self.minute(),
                    second,
                )
            }
        }
    }

    fn step_by(self, unit: DurationUnit, n_units: u32) -> SeriesResult<Self> {
        let stepped = match unit {
            DurationUnit::Years => self.checked_add_months(chrono::Months::new(n_units * 12)),
            DurationUnit::Months => self.checked_add_months(chrono::Months::new(n_units)),
            DurationUnit::Weeks => self.checked_add_signed(Duration::weeks(n_units as i64)),
            DurationUnit::Days => self.checked_add_signed(Duration::days(n_units as i64)),
            DurationUnit::Hours => self.checked_add_signed(Duration::hours(n_units as i64)),
            DurationUnit::Minutes => self.checked_add_signed(Duration::minutes(n_units as i64)),
            DurationUnit::Seconds => self.checked_add_signed(Duration::seconds(n_units as i64)),
        };
        stepped.ok_or_else(|| {
            SeriesError::bad_argument(format!("stepping by {n_units} {unit:?} overflows"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        ymd_hms(year, month, day, hour, minute, second).unwrap()
    }

    #[test]
    fn test_midpoint_and_fraction() {
        assert_eq!(TimePoint::midpoint(2i64, 10i64), 6);
        assert_eq!(TimePoint::midpoint(0.0, 3.0), 1.5);
        assert_eq!(
            TimePoint::midpoint(dt(2015, 3, 1, 0, 0, 0), dt(2015, 3, 2, 0, 0, 0)),
            dt(2015, 3, 1, 12, 0, 0)
        );
        assert_eq!(f64::fraction(1.0, 3.0, 2.5), 0.75);
        assert_eq!(i64::fraction(0, 4, 1), 0.25);
    }

    #[test]
    fn test_span_units_wall_clock_is_seconds() {
        let span = <DateTime<Utc> as TimePoint>::span_between(
            dt(2015, 3, 1, 0, 0, 0),
            dt(2015, 3, 2, 0, 0, 0),
        );
        assert_eq!(<DateTime<Utc> as TimePoint>::span_units(span), 86400.0);
    }

    #[test]
    fn test_nan_keys_are_ordered() {
        assert_eq!(f64::NAN.cmp_points(&f64::NAN), Ordering::Equal);
        assert_eq!(1.0f64.cmp_points(&f64::NAN), Ordering::Less);
    }

    #[test]
    fn test_floor_months() {
        // nearest three months from 2016-05-06 goes back to April 1st
        let floored = dt(2016, 5, 6, 11, 45, 6)
            .floor_to(DurationUnit::Months, 3)
            .unwrap();
        assert_eq!(floored, dt(2016, 4, 1, 0, 0, 0));
    }

    #[test]
    fn test_floor_minutes() {
        let floored = dt(2016, 5, 6, 11, 45, 6)
            .floor_to(DurationUnit::Minutes, 15)
            .unwrap();
        assert_eq!(floored, dt(2016, 5, 6, 11, 45, 0));
    }

    #[test]
    fn test_floor_years() {
        let floored = dt(2017, 7, 14, 1, 2, 3)
            .floor_to(DurationUnit::Years, 2)
            .unwrap();
        assert_eq!(floored, dt(2017, 1, 1, 0, 0, 0));
        let floored = dt(2016, 7, 14, 1, 2, 3)
            .floor_to(DurationUnit::Years, 2)
            .unwrap();
        assert_eq!(floored, dt(2015, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_step_calendar_aware() {
        let start = dt(2016, 1, 31, 0, 0, 0);
        assert_eq!(
            start.step_by(DurationUnit::Months, 1).unwrap(),
            dt(2016, 2, 29, 0, 0, 0)
        );
        assert_eq!(
            start.step_by(DurationUnit::Days, 1).unwrap(),
            dt(2016, 2, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(
            "weeks".parse::<DurationUnit>().unwrap(),
            DurationUnit::Weeks
        );
        assert!(matches!(
            "fortnights".parse::<DurationUnit>(),
            Err(SeriesError::BadArgument(_))
        ));
    }
}

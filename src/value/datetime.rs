//! Temporal payloads for [`crate::value::Value`].
//!
//! All three types live in GMT and validate their fields at construction
//! through chrono's proleptic Gregorian calendar. Months are 0-indexed
//! (January = 0) across the whole crate, matching the query-language
//! calendar model; chrono's 1-indexed months appear only at the boundary.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::value::ValueError;

/// A calendar date: year, 0-indexed month, day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateValue {
    year: i32,
    month: u32,
    day: u32,
}

impl DateValue {
    /// Build a date, rejecting impossible field combinations (2025-02-30,
    /// month 12, day 0).
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ValueError> {
        NaiveDate::from_ymd_opt(year, month + 1, day)
            .map(|_| Self { year, month, day })
            .ok_or(ValueError::InvalidDate { year, month, day })
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
            day: date.day(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 0-indexed month (January = 0).
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn to_naive(&self) -> NaiveDate {
        // Fields were validated at construction.
        NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)
            .unwrap_or(NaiveDate::MIN)
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month + 1, self.day)
    }
}

/// A calendar date with a time of day, millisecond precision, GMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTimeValue {
    date: DateValue,
    time: TimeOfDayValue,
}

impl DateTimeValue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            date: DateValue::new(year, month, day)?,
            time: TimeOfDayValue::new(hour, minute, second, millisecond)?,
        })
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self {
            date: DateValue::from_naive(datetime.date()),
            time: TimeOfDayValue::from_naive(datetime.time()),
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// 0-indexed month (January = 0).
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }

    pub fn millisecond(&self) -> u32 {
        self.time.millisecond()
    }

    /// The date portion, with the time of day truncated away.
    pub fn date_part(&self) -> DateValue {
        self.date
    }

    pub fn time_part(&self) -> TimeOfDayValue {
        self.time
    }

    pub fn to_naive(&self) -> NaiveDateTime {
        self.date.to_naive().and_time(self.time.to_naive())
    }
}

impl std::fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

/// A wall-clock time with no date, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDayValue {
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl TimeOfDayValue {
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Result<Self, ValueError> {
        NaiveTime::from_hms_milli_opt(hour, minute, second, millisecond)
            .map(|_| Self {
                hour,
                minute,
                second,
                millisecond,
            })
            .ok_or(ValueError::InvalidTimeOfDay {
                hour,
                minute,
                second,
                millisecond,
            })
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            millisecond: time.nanosecond() / 1_000_000,
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn millisecond(&self) -> u32 {
        self.millisecond
    }

    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl std::fmt::Display for TimeOfDayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.millisecond != 0 {
            write!(f, ".{:03}", self.millisecond)?;
        }
        Ok(())
    }
}

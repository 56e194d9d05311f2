use crate::error::{google_calendar_error, CalendarResult};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use std::fmt;

/// How far back the default listing reaches
pub const YEARS_BACK: i32 = 5;
/// How far ahead the default listing reaches
pub const YEARS_AHEAD: i32 = 2;

/// Bounds passed as timeMin/timeMax to the events listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub time_min: String,
    pub time_max: String,
}

/// Window reaching `YEARS_BACK` years before and `YEARS_AHEAD` years after `now`
pub fn query_window(now: DateTime<Utc>) -> CalendarResult<QueryWindow> {
    let now = now.naive_utc();
    let min = shift_years(now, -YEARS_BACK)
        .ok_or_else(|| google_calendar_error("Query window start is out of range"))?;
    let max = shift_years(now, YEARS_AHEAD)
        .ok_or_else(|| google_calendar_error("Query window end is out of range"))?;

    Ok(QueryWindow {
        time_min: format_utc(min),
        time_max: format_utc(max),
    })
}

/// Move a timestamp by whole years; 29 February becomes 28 February in non-leap years
fn shift_years(at: NaiveDateTime, years: i32) -> Option<NaiveDateTime> {
    let target = at.year().checked_add(years)?;
    at.with_year(target)
        .or_else(|| at.with_day(28).and_then(|d| d.with_year(target)))
}

/// ISO-8601 with a trailing `Z`; microseconds only when non-zero
pub fn format_utc(at: NaiveDateTime) -> String {
    let base = at.format("%Y-%m-%dT%H:%M:%S");
    let micros = at.nanosecond() / 1_000;
    if micros == 0 {
        format!("{}Z", base)
    } else {
        format!("{}.{:06}Z", base, micros)
    }
}

/// First and last second of a calendar day.
///
/// Components are written unpadded, e.g. `2020-10-3T00:00:00.0000Z`.
pub fn day_bounds(year: i32, month: i32, day: i32) -> QueryWindow {
    QueryWindow {
        time_min: format!("{}-{}-{}T00:00:00.0000Z", year, month, day),
        time_max: format!("{}-{}-{}T23:59:59.0000Z", year, month, day),
    }
}

/// Problem spotted in a user-supplied date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWarning {
    MonthOutOfRange(i32),
    DayOutOfRange(i32),
}

impl fmt::Display for DateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWarning::MonthOutOfRange(month) => {
                write!(f, "Warning: month {} is not between 1 and 12", month)
            }
            DateWarning::DayOutOfRange(day) => {
                write!(f, "Warning: day {} is not between 1 and 31", day)
            }
        }
    }
}

/// Range check of date components. Only reports, never rejects.
pub fn validate_date(_year: i32, month: i32, day: i32) -> Vec<DateWarning> {
    let mut warnings = Vec::new();
    if !(1..=12).contains(&month) {
        warnings.push(DateWarning::MonthOutOfRange(month));
    }
    if !(1..=31).contains(&day) {
        warnings.push(DateWarning::DayOutOfRange(day));
    }
    warnings
}

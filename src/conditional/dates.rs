//! FILENAME: src/conditional/dates.rs
//! PURPOSE: Date-bucket coercion for the `cellValue`/date conditional-
//! formatting rules (e.g. "yesterday", "this week", "last month").
//! CONTEXT: Treats a raw `CellValue::Number` as an Excel serial day count
//! (days since 1899-12-30), matching `style::NumberFormat::Date`'s epoch
//! assumption. Deliberately NOT unified with the filter engine's
//! milliseconds-since-epoch boundary (`filter::predicates::coerce_date_ms`)
//! — the two call sites coerce the same raw number under different units.

use chrono::{Datelike, NaiveDate};

use crate::cell::CellValue;

/// The named date buckets a `DateRule` can test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Yesterday,
    Today,
    Tomorrow,
    Last7Days,
    ThisWeek,
    LastWeek,
    NextWeek,
    ThisMonth,
    LastMonth,
    NextMonth,
}

/// Converts a raw cell value to a calendar date under the Excel-serial
/// coercion policy. Returns `None` for non-numeric or out-of-range values.
pub fn excel_serial_to_date(value: &CellValue) -> Option<NaiveDate> {
    let n = value.as_number()?;
    crate::number_format::excel_serial_to_naive_date(n)
}

/// Tests whether `date` falls within `bucket`, relative to `today`.
pub fn date_in_bucket(date: NaiveDate, bucket: DateBucket, today: NaiveDate) -> bool {
    match bucket {
        DateBucket::Yesterday => date == today - chrono::Duration::days(1),
        DateBucket::Today => date == today,
        DateBucket::Tomorrow => date == today + chrono::Duration::days(1),
        DateBucket::Last7Days => {
            let start = today - chrono::Duration::days(6);
            date >= start && date <= today
        }
        DateBucket::ThisWeek => week_of(date) == week_of(today),
        DateBucket::LastWeek => week_of(date) == week_of(today) - 1,
        DateBucket::NextWeek => week_of(date) == week_of(today) + 1,
        DateBucket::ThisMonth => date.year() == today.year() && date.month() == today.month(),
        DateBucket::LastMonth => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            date.year() == year && date.month() == month
        }
        DateBucket::NextMonth => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            date.year() == year && date.month() == month
        }
    }
}

/// ISO week number relative to the start of the year, used to compare
/// "this week"/"last week" without pulling in a full calendar-week crate.
fn week_of(date: NaiveDate) -> i64 {
    date.iso_week().week() as i64 + date.iso_week().year() as i64 * 53
}

use chrono::{Local, NaiveDate};

use crate::models::MonthKey;

/// Parses the calendar date at the front of an ISO-8601 value.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time part introduced by
/// `T` or a space. Anything else yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() < 10 || !raw.is_char_boundary(10) {
        return None;
    }

    let (day, rest) = raw.split_at(10);
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }

    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// The `count` calendar months ending with the month of `reference`,
/// oldest first.
pub fn trailing_months(reference: NaiveDate, count: usize) -> Vec<MonthKey> {
    let mut months = Vec::with_capacity(count);
    let mut month = MonthKey::of(reference);

    for _ in 0..count {
        months.push(month);
        month = month.previous();
    }

    months.reverse();
    months
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

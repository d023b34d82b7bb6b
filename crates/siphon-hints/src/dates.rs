// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Date parsing for `[date:...]` values and dictated dates.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::{Captures, Regex};

/// Formats accepted in `[date:...]`, tried in order. Day-first wins over
/// month-first for ambiguous slashed dates.
const EXPLICIT_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d",
];

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static ORDINAL_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b(?:,?\s+(\d{{4}}))?"
    ))
    .unwrap()
});

static MONTH_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
    ))
    .unwrap()
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static LAST_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blast month\b").unwrap());
static LAST_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blast week\b").unwrap());
static YESTERDAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\byesterday\b").unwrap());

/// Parse an explicit `[date:...]` value.
pub fn parse_explicit(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    EXPLICIT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    let month = match &name[..3.min(name.len())] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Builds a date, defaulting the year so the result is never in the future.
fn dictated(day: &str, month: &str, year: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month = month_number(month)?;
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year.parse().ok()?, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year > today {
                NaiveDate::from_ymd_opt(today.year() - 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

fn first_valid<F>(re: &Regex, text: &str, build: F) -> Option<NaiveDate>
where
    F: Fn(&Captures<'_>) -> Option<NaiveDate>,
{
    re.captures_iter(text).find_map(|caps| build(&caps))
}

/// "15th of June", "3rd March 2023".
pub fn ordinal_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    first_valid(&ORDINAL_MONTH, text, |c| {
        dictated(&c[1], &c[2], c.get(3).map(|m| m.as_str()), today)
    })
}

/// "June 15th", "March 3rd, 2023".
pub fn month_ordinal(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    first_valid(&MONTH_ORDINAL, text, |c| {
        dictated(&c[2], &c[1], c.get(3).map(|m| m.as_str()), today)
    })
}

pub fn iso(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    first_valid(&ISO_DATE, text, |c| {
        NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
    })
}

pub fn last_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    LAST_MONTH
        .is_match(text)
        .then(|| today.checked_sub_months(Months::new(1)))
        .flatten()
}

pub fn last_week(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    LAST_WEEK
        .is_match(text)
        .then(|| today.checked_sub_days(Days::new(7)))
        .flatten()
}

pub fn yesterday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    YESTERDAY
        .is_match(text)
        .then(|| today.checked_sub_days(Days::new(1)))
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn explicit_formats() {
        assert_eq!(parse_explicit("15/06/2024"), Some(d(2024, 6, 15)));
        assert_eq!(parse_explicit("2024-06-15"), Some(d(2024, 6, 15)));
        assert_eq!(parse_explicit("15.06.2024"), Some(d(2024, 6, 15)));
        assert_eq!(parse_explicit("20240615"), Some(d(2024, 6, 15)));
        assert_eq!(parse_explicit(" 01-02-2023 "), Some(d(2023, 2, 1)));
        assert_eq!(parse_explicit("31/02/2024"), None);
        assert_eq!(parse_explicit("soon"), None);
    }

    #[test]
    fn ordinal_then_month() {
        let today = d(2024, 9, 1);
        assert_eq!(ordinal_month("dated the 15th of June", today), Some(d(2024, 6, 15)));
        assert_eq!(ordinal_month("3rd March 2021 lease", today), Some(d(2021, 3, 3)));
    }

    #[test]
    fn month_then_ordinal() {
        let today = d(2024, 9, 1);
        assert_eq!(month_ordinal("signed on March 3rd, 2023", today), Some(d(2023, 3, 3)));
        assert_eq!(month_ordinal("june 15th", today), Some(d(2024, 6, 15)));
    }

    #[test]
    fn yearless_future_date_rolls_back_a_year() {
        let today = d(2024, 2, 10);
        assert_eq!(month_ordinal("December 24th", today), Some(d(2023, 12, 24)));
    }

    #[test]
    fn impossible_dates_are_skipped() {
        let today = d(2024, 9, 1);
        assert_eq!(ordinal_month("the 31st of February", today), None);
    }

    #[test]
    fn relative_dates() {
        let today = d(2024, 3, 31);
        assert_eq!(yesterday("I bought it yesterday", today), Some(d(2024, 3, 30)));
        assert_eq!(last_week("from last week", today), Some(d(2024, 3, 24)));
        assert_eq!(last_month("paid last month", today), Some(d(2024, 2, 29)));
        assert_eq!(last_month("next month", today), None);
    }

    #[test]
    fn iso_in_running_text() {
        assert_eq!(iso("invoice 2023-11-05 attached", d(2024, 1, 1)), Some(d(2023, 11, 5)));
    }
}

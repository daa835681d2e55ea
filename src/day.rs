//! Resolution of the weekday a plan summary refers to.
//!
//! The weekday is derived from the most trustworthy evidence available,
//! falling back step by step:
//!
//! 1. a sentence in the summary opening with "Für <Tag>",
//! 2. the older greeting form "Hallo <Name>, für <Tag>",
//! 3. the first weekday named anywhere in the plan text,
//! 4. the first `DD.MM.YYYY` or `DD.MM.` date token in the plan text,
//! 5. today's weekday in the school's time zone.
//!
//! The ordering is a trust ranking over the sources and must stay
//! intact: the model's own label outranks anything recovered from the
//! raw text, and the wall clock is only consulted when every other
//! source is silent. Given identical inputs the chain is deterministic
//! up to step 5, which depends on the current date.

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Europe::Berlin;
use once_cell::sync::Lazy;
use regex::Regex;

/// German weekday labels in canonical order, Monday first.
pub const WEEKDAYS: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

static SUMMARY_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|[.!?]\s+)Für\s+(\w+)").unwrap());

static GREETING_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Hallo\s+\w+,\s*für\s+(\w+)").unwrap());

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})?").unwrap());

/// Resolves the weekday for `summary` and `plan_text` as of now.
pub fn resolve_day(summary: &str, plan_text: &str) -> String {
    let today = Utc::now().with_timezone(&Berlin).date_naive();
    resolve_day_on(summary, plan_text, today)
}

/// Resolution with an explicit notion of "today".
///
/// Separated from [`resolve_day`] so the full chain, including the
/// year completion in step 4 and the final fallback, can be tested
/// against any calendar date.
pub fn resolve_day_on(summary: &str, plan_text: &str, today: NaiveDate) -> String {
    if let Some(captures) = SUMMARY_DAY.captures(summary) {
        return captures[1].to_string();
    }

    if let Some(captures) = GREETING_DAY.captures(summary) {
        return captures[1].to_string();
    }

    for day in WEEKDAYS {
        if plan_text.contains(day) {
            return day.to_string();
        }
    }

    if let Some(day) = day_from_date_token(plan_text, today) {
        return day;
    }

    weekday_label(today)
}

/// Maps the first date token in `plan_text` onto a weekday label.
///
/// A token without a year is completed with the current year. A token
/// that does not form a real calendar date yields `None`, letting the
/// chain fall through to the wall-clock fallback.
fn day_from_date_token(plan_text: &str, today: NaiveDate) -> Option<String> {
    let captures = DATE_TOKEN.captures(plan_text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let year: i32 = match captures.get(3) {
        Some(year) => year.as_str().parse().ok()?,
        None => today.year(),
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(weekday_label(date))
}

/// The German label for a date's weekday.
fn weekday_label(date: NaiveDate) -> String {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize].to_string()
}

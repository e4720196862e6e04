//! Best-effort parsing of the publication times shown next to comments.
//!
//! YouTube shows relative times ("3 days ago", "1 year ago (edited)").
//! These are resolved against a reference instant. Absolute dates are
//! accepted too. Anything else yields `None`.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

static RELATIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s+(second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago$")
        .unwrap()
});

static EDITED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(edited\)\s*$").unwrap());

/// Parse a displayed publication time relative to `now`.
pub fn parse_time_posted(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = EDITED_SUFFIX.replace(raw.trim(), "");
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    if text.eq_ignore_ascii_case("just now") || text.eq_ignore_ascii_case("now") {
        return Some(now);
    }

    if let Some(caps) = RELATIVE_PATTERN.captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_ascii_lowercase();
        let delta = match unit.as_str() {
            "second" | "sec" => Duration::try_seconds(amount)?,
            "minute" | "min" => Duration::try_minutes(amount)?,
            "hour" | "hr" => Duration::try_hours(amount)?,
            "day" => Duration::try_days(amount)?,
            "week" => Duration::try_weeks(amount)?,
            "month" => Duration::try_days(amount.checked_mul(30)?)?,
            "year" => Duration::try_days(amount.checked_mul(365)?)?,
            _ => return None,
        };
        return now.checked_sub_signed(delta);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

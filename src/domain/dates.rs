//! Estimation of calendar dates from the relative dates review views display.
//!
//! Views show "2 years ago", "a month ago", "Edited 3 weeks ago" and similar.
//! The estimate uses 365-day years and 30-day months; anything else is left
//! unresolved rather than guessed.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+|an?)\s+(year|month|week|day|hour|minute)s?\s+ago\b")
        .expect("relative date pattern is valid")
});

const ABSOLUTE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d/%m/%Y"];

/// Estimate the calendar date a displayed date refers to, relative to `today`.
pub fn estimate_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    if lower.contains("just now") || lower.contains("today") {
        return Some(today);
    }
    if lower.contains("yesterday") {
        return today.checked_sub_signed(Duration::days(1));
    }

    if let Some(caps) = RELATIVE.captures(&lower) {
        let amount = match &caps[1] {
            "a" | "an" => 1,
            n => n.parse::<i64>().ok()?,
        };
        let days = match &caps[2] {
            "year" => amount.checked_mul(365)?,
            "month" => amount.checked_mul(30)?,
            "week" => amount.checked_mul(7)?,
            "day" => amount,
            // hours and minutes ago are still today
            _ => 0,
        };
        return today.checked_sub_signed(Duration::try_days(days)?);
    }

    ABSOLUTE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

//! Logical dates: parsing relative references and labelling days

use crate::error::{Result, VjourError};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// A date as typed by the user, resolved against "today"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeReference {
    Today,
    Yesterday,
    Tomorrow,
    /// Today if it matches, otherwise the most recent occurrence
    Weekday(Weekday),
    /// Strictly before today
    LastWeekday(Weekday),
    /// Strictly after today
    NextWeekday(Weekday),
    SpecificDate(NaiveDate),
}

impl TimeReference {
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_lowercase();
        let invalid = || VjourError::InvalidDate(input.to_string());

        match normalized.as_str() {
            "today" | "now" => return Ok(TimeReference::Today),
            "yesterday" => return Ok(TimeReference::Yesterday),
            "tomorrow" => return Ok(TimeReference::Tomorrow),
            _ => {}
        }

        if let Some(day) = normalized.strip_prefix("last ") {
            return parse_weekday(day)
                .map(TimeReference::LastWeekday)
                .ok_or_else(invalid);
        }
        if let Some(day) = normalized.strip_prefix("next ") {
            return parse_weekday(day)
                .map(TimeReference::NextWeekday)
                .ok_or_else(invalid);
        }
        if let Some(weekday) = parse_weekday(&normalized) {
            return Ok(TimeReference::Weekday(weekday));
        }

        NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
            .map(TimeReference::SpecificDate)
            .map_err(|_| invalid())
    }

    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            TimeReference::Today => today,
            TimeReference::Yesterday => today - Duration::days(1),
            TimeReference::Tomorrow => today + Duration::days(1),
            TimeReference::Weekday(day) => today - Duration::days(days_back(today, *day, 0)),
            TimeReference::LastWeekday(day) => today - Duration::days(days_back(today, *day, 7)),
            TimeReference::NextWeekday(day) => {
                today + Duration::days(days_forward(today, *day))
            }
            TimeReference::SpecificDate(date) => *date,
        }
    }
}

/// Full lowercase weekday names only
fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Days back to `target`; `same_day` is used when today already is `target`
fn days_back(today: NaiveDate, target: Weekday, same_day: i64) -> i64 {
    let diff = (today.weekday().num_days_from_monday() + 7 - target.num_days_from_monday()) % 7;
    if diff == 0 {
        same_day
    } else {
        diff as i64
    }
}

fn days_forward(today: NaiveDate, target: Weekday) -> i64 {
    let diff = (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    if diff == 0 {
        7
    } else {
        diff as i64
    }
}

/// Heading for a feed day: "Today", "Yesterday" or e.g. "January 17"
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if date == today - Duration::days(1) {
        "Yesterday".to_string()
    } else {
        format!("{} {}", date.format("%B"), date.day())
    }
}

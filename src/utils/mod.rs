//! Argument parsing shared by commands.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use classbell_core::constants::{DATE_FORMAT, TIME_FORMAT};

/// Parse "today", "tomorrow", "yesterday" or YYYY-MM-DD relative to `today`.
pub fn parse_day(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match input.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("tomorrow") => Ok(today + Duration::days(1)),
        Some("yesterday") => Ok(today - Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{}'. Expected YYYY-MM-DD", s)),
    }
}

pub fn parse_time(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
        .with_context(|| format!("Invalid time '{}'. Expected HH:MM", input))
}

/// Parse "3-4" or a single "3" into an inclusive range.
pub fn parse_span(input: &str) -> Result<(u32, u32)> {
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .with_context(|| format!("Invalid number '{}' in '{}'", s, input))
    };

    match input.split_once('-') {
        Some((from, to)) => Ok((parse(from)?, parse(to)?)),
        None => {
            let n = parse(input)?;
            Ok((n, n))
        }
    }
}

/// Parse a weekday as 1-7 or its English name/abbreviation.
pub fn parse_weekday(input: &str) -> Result<u32> {
    let lower = input.trim().to_lowercase();
    if let Ok(n) = lower.parse::<u32>() {
        return Ok(n);
    }

    let day = match lower.get(..3) {
        Some("mon") => 1,
        Some("tue") => 2,
        Some("wed") => 3,
        Some("thu") => 4,
        Some("fri") => 5,
        Some("sat") => 6,
        Some("sun") => 7,
        _ => anyhow::bail!("Invalid weekday '{}'. Use 1-7 or a day name", input),
    };
    Ok(day)
}

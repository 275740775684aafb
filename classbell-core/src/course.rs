//! Recurring courses: a weekly slot valid over a range of teaching weeks.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{BellError, BellResult};

/// Odd/even week filter of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    /// Every week.
    #[default]
    None,
    Odd,
    Even,
}

impl WeekParity {
    /// Parity tag of a week number.
    pub fn of_week(week: u32) -> Self {
        if week % 2 == 1 {
            WeekParity::Odd
        } else {
            WeekParity::Even
        }
    }

    /// Whether a course with this filter runs in `week`.
    pub fn admits(self, week: u32) -> bool {
        self == WeekParity::None || self == Self::of_week(week)
    }
}

impl fmt::Display for WeekParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekParity::None => write!(f, "every week"),
            WeekParity::Odd => write!(f, "odd weeks"),
            WeekParity::Even => write!(f, "even weeks"),
        }
    }
}

/// A recurring class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(default)]
    pub color: String,

    /// ISO day of week, Monday = 1 .. Sunday = 7.
    pub day_of_week: u32,
    pub start_period: u32,
    pub end_period: u32,
    pub start_week: u32,
    pub end_week: u32,
    #[serde(default)]
    pub parity: WeekParity,

    /// Dates on which a single occurrence was removed.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_dates: BTreeSet<NaiveDate>,
}

impl Course {
    pub fn new(
        name: impl Into<String>,
        day_of_week: u32,
        periods: (u32, u32),
        weeks: (u32, u32),
    ) -> Self {
        Course {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            location: None,
            teacher: None,
            color: String::new(),
            day_of_week,
            start_period: periods.0,
            end_period: periods.1,
            start_week: weeks.0,
            end_week: weeks.1,
            parity: WeekParity::None,
            excluded_dates: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> BellResult<()> {
        if !(1..=7).contains(&self.day_of_week) {
            return Err(BellError::InvalidCourse(format!(
                "day of week {} is not in 1..=7",
                self.day_of_week
            )));
        }
        if self.start_period == 0 || self.start_period > self.end_period {
            return Err(BellError::InvalidCourse(format!(
                "period range {}-{} is empty",
                self.start_period, self.end_period
            )));
        }
        if self.start_week == 0 || self.start_week > self.end_week {
            return Err(BellError::InvalidCourse(format!(
                "week range {}-{} is empty",
                self.start_week, self.end_week
            )));
        }
        if self.name.trim().is_empty() {
            return Err(BellError::InvalidCourse("name is empty".into()));
        }
        Ok(())
    }

    /// Whether the course meets on `date`, given that `date` lies in teaching week `week`.
    pub fn meets_on(&self, date: NaiveDate, week: u32) -> bool {
        (self.start_week..=self.end_week).contains(&week)
            && self.parity.admits(week)
            && date.weekday().number_from_monday() == self.day_of_week
            && !self.excluded_dates.contains(&date)
    }

    /// Remove the single occurrence on `date`. Returns false if it was already removed.
    pub fn exclude(&mut self, date: NaiveDate) -> bool {
        self.excluded_dates.insert(date)
    }

    /// Location line shown on occurrences: room, then teacher.
    pub fn place(&self) -> Option<String> {
        match (self.location.as_deref(), self.teacher.as_deref()) {
            (Some(loc), Some(teacher)) => Some(format!("{loc} · {teacher}")),
            (Some(loc), None) => Some(loc.to_string()),
            (None, Some(teacher)) => Some(teacher.to_string()),
            (None, None) => None,
        }
    }

    /// Human-readable period span, e.g. "Periods 3-4".
    pub fn period_label(&self) -> String {
        if self.start_period == self.end_period {
            format!("Period {}", self.start_period)
        } else {
            format!("Periods {}-{}", self.start_period, self.end_period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parity_filter() {
        assert!(WeekParity::None.admits(3));
        assert!(WeekParity::None.admits(4));
        assert!(WeekParity::Odd.admits(3));
        assert!(!WeekParity::Odd.admits(4));
        assert!(WeekParity::Even.admits(4));
        assert!(!WeekParity::Even.admits(3));
    }

    #[test]
    fn meets_on_checks_weekday_weeks_and_exclusions() {
        let mut course = Course::new("Compilers", 3, (1, 2), (1, 16));

        assert!(course.meets_on(date("2024-09-18"), 3));
        assert!(!course.meets_on(date("2024-09-19"), 3));
        assert!(!course.meets_on(date("2024-09-18"), 17));

        assert!(course.exclude(date("2024-09-18")));
        assert!(!course.exclude(date("2024-09-18")));
        assert!(!course.meets_on(date("2024-09-18"), 3));
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        assert!(Course::new("Algebra", 1, (1, 2), (1, 16)).validate().is_ok());
        assert!(Course::new("Algebra", 8, (1, 2), (1, 16)).validate().is_err());
        assert!(Course::new("Algebra", 0, (1, 2), (1, 16)).validate().is_err());
        assert!(Course::new("Algebra", 1, (3, 2), (1, 16)).validate().is_err());
        assert!(Course::new("Algebra", 1, (0, 2), (1, 16)).validate().is_err());
        assert!(Course::new("Algebra", 1, (1, 2), (9, 8)).validate().is_err());
        assert!(Course::new(" ", 1, (1, 2), (1, 16)).validate().is_err());
    }

    #[test]
    fn place_joins_room_and_teacher() {
        let mut course = Course::new("Algebra", 1, (1, 2), (1, 16));
        assert_eq!(course.place(), None);

        course.teacher = Some("Dr. Wu".into());
        assert_eq!(course.place().as_deref(), Some("Dr. Wu"));

        course.location = Some("B-204".into());
        assert_eq!(course.place().as_deref(), Some("B-204 · Dr. Wu"));
    }

    #[test]
    fn serde_uses_lowercase_parity() {
        let json = r#"{
            "id": "c1", "name": "Physics", "dayOfWeek": 2,
            "startPeriod": 3, "endPeriod": 4, "startWeek": 1, "endWeek": 8,
            "parity": "even", "excludedDates": ["2024-09-10"]
        }"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.parity, WeekParity::Even);
        assert!(course.excluded_dates.contains(&date("2024-09-10")));
        assert_eq!(course.location, None);
    }
}

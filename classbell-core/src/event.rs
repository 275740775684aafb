//! Concrete events: one-off entries and materialized course occurrences.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::constants::{DATE_FORMAT, MAX_REMINDER_MINUTES, OCCURRENCE_ID_PREFIX, TIME_FORMAT};
use crate::error::{BellError, BellResult};

/// What an event is, with the payload specific to that shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    /// A plain calendar entry.
    #[default]
    Event,
    /// A transient pickup or delivery code.
    Pickup {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform: Option<String>,
    },
}

/// A concrete event with a date, a clock span and reminders.
///
/// Dates and times are stored as entered (`YYYY-MM-DD`, `HH:MM`); parsing
/// happens when triggers are planned so a malformed entry only loses its own
/// triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub important: bool,
    /// Screenshot the event was recognized from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    /// Minutes before start at which to remind, ordered and unique.
    #[serde(default)]
    pub reminders: BTreeSet<u32>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            start_date: start.date().format(DATE_FORMAT).to_string(),
            end_date: end.date().format(DATE_FORMAT).to_string(),
            start_time: start.time().format(TIME_FORMAT).to_string(),
            end_time: end.time().format(TIME_FORMAT).to_string(),
            location: None,
            description: None,
            color: String::new(),
            important: false,
            source_image: None,
            reminders: BTreeSet::new(),
            kind: EventKind::Event,
        }
    }

    /// Identity of the occurrence of `course_id` on `date`.
    /// Stable across recomputation so triggers planned for it can be found again.
    pub fn occurrence_id(course_id: &str, date: NaiveDate) -> String {
        format!("{}{}_{}", OCCURRENCE_ID_PREFIX, course_id, date.format(DATE_FORMAT))
    }

    pub fn is_occurrence(&self) -> bool {
        self.id.starts_with(OCCURRENCE_ID_PREFIX)
    }

    pub fn start_local(&self) -> Option<NaiveDateTime> {
        parse_local(&self.start_date, &self.start_time)
    }

    pub fn end_local(&self) -> Option<NaiveDateTime> {
        parse_local(&self.end_date, &self.end_time)
    }

    pub fn pickup_code(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Pickup { code, .. } => Some(code),
            EventKind::Event => None,
        }
    }

    /// `08:00-09:40`, with the start date prepended when the event spans days.
    pub fn time_range(&self) -> String {
        if self.start_date == self.end_date {
            format!("{}-{}", self.start_time, self.end_time)
        } else {
            format!(
                "{} {}-{} {}",
                self.start_date, self.start_time, self.end_date, self.end_time
            )
        }
    }

    pub fn validate(&self) -> BellResult<()> {
        if self.title.trim().is_empty() {
            return Err(BellError::InvalidEvent("title is empty".into()));
        }
        NaiveDate::parse_from_str(&self.start_date, DATE_FORMAT)
            .map_err(|_| BellError::InvalidDate(self.start_date.clone()))?;
        NaiveTime::parse_from_str(&self.start_time, TIME_FORMAT)
            .map_err(|_| BellError::InvalidTime(self.start_time.clone()))?;

        if let Some(too_far) = self.reminders.iter().find(|m| **m > MAX_REMINDER_MINUTES) {
            return Err(BellError::InvalidEvent(format!(
                "reminder {too_far} minutes ahead exceeds {MAX_REMINDER_MINUTES}"
            )));
        }

        if let (Some(start), Some(end)) = (self.start_local(), self.end_local()) {
            if end < start {
                return Err(BellError::InvalidEvent("ends before it starts".into()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

fn parse_local(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).ok()?;
    Some(date.and_time(time))
}

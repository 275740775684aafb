//! Course expansion: which course occurrences fall on a calendar date.
//!
//! Expansion is pure and deterministic. Occurrence identities are derived from
//! (course id, date), so expanding the same day twice yields identical events.

use chrono::{Duration, NaiveDate};

use crate::constants::{DATE_FORMAT, TIME_FORMAT};
use crate::course::Course;
use crate::event::{Event, EventKind};
use crate::period::PeriodTable;
use crate::term::TermConfig;

/// Expands courses against one term.
#[derive(Debug, Clone)]
pub struct ScheduleExpander {
    term: TermConfig,
    periods: PeriodTable,
}

impl ScheduleExpander {
    /// Bind to a term. The period table is resolved once, falling back to the
    /// built-in table if the term's is missing or corrupt.
    pub fn new(term: &TermConfig) -> Self {
        ScheduleExpander {
            term: term.clone(),
            periods: term.period_table(),
        }
    }

    pub fn term(&self) -> &TermConfig {
        &self.term
    }

    pub fn periods(&self) -> &PeriodTable {
        &self.periods
    }

    /// Occurrences of `courses` on `date`, in course order.
    pub fn expand(&self, date: NaiveDate, courses: &[Course]) -> Vec<Event> {
        let Some(week) = self.term.week_of(date) else {
            return Vec::new();
        };

        courses
            .iter()
            .filter(|course| course.meets_on(date, week))
            .filter_map(|course| self.materialize(course, date))
            .collect()
    }

    /// Occurrences for every date in `from..=to`, ordered by date.
    pub fn expand_range(&self, from: NaiveDate, to: NaiveDate, courses: &[Course]) -> Vec<Event> {
        let mut events = Vec::new();
        let mut date = from;
        while date <= to {
            events.extend(self.expand(date, courses));
            date += Duration::days(1);
        }
        events
    }

    fn materialize(&self, course: &Course, date: NaiveDate) -> Option<Event> {
        let Some((start, end)) = self.periods.resolve(course.start_period, course.end_period)
        else {
            tracing::warn!(
                course = %course.id,
                start_period = course.start_period,
                end_period = course.end_period,
                "Course periods missing from period table, skipping occurrence"
            );
            return None;
        };

        let day = date.format(DATE_FORMAT).to_string();

        Some(Event {
            id: Event::occurrence_id(&course.id, date),
            title: course.name.clone(),
            start_date: day.clone(),
            end_date: day,
            start_time: start.format(TIME_FORMAT).to_string(),
            end_time: end.format(TIME_FORMAT).to_string(),
            location: course.place(),
            description: Some(course.period_label()),
            color: course.color.clone(),
            important: false,
            source_image: None,
            reminders: Default::default(),
            kind: EventKind::Event,
        })
    }
}

/// Occurrences of `courses` on `date` under `term`.
pub fn expand(date: NaiveDate, courses: &[Course], term: &TermConfig) -> Vec<Event> {
    ScheduleExpander::new(term).expand(date, courses)
}

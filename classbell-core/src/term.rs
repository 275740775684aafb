//! Term configuration: when teaching weeks start and how periods map to clock times.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{DATE_FORMAT, DEFAULT_TOTAL_WEEKS};
use crate::course::WeekParity;
use crate::period::PeriodTable;

fn default_total_weeks() -> u32 {
    DEFAULT_TOTAL_WEEKS
}

/// Term settings as stored by the persistence layer.
///
/// `start_date` and `period_table` are kept in their serialized form: a term
/// with a missing or unreadable start date simply has no teaching weeks, and
/// an unreadable period table falls back to the built-in one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    #[serde(default = "default_total_weeks")]
    pub total_weeks: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_table: Option<String>,
}

impl Default for TermConfig {
    fn default() -> Self {
        TermConfig {
            start_date: None,
            total_weeks: DEFAULT_TOTAL_WEEKS,
            period_table: None,
        }
    }
}

impl TermConfig {
    pub fn new(start: NaiveDate, total_weeks: u32) -> Self {
        TermConfig {
            start_date: Some(start.format(DATE_FORMAT).to_string()),
            total_weeks,
            period_table: None,
        }
    }

    pub fn with_period_table(mut self, table: &PeriodTable) -> Self {
        self.period_table = table.to_json().ok();
        self
    }

    /// Parsed term start, or None when unset or unparsable.
    pub fn start(&self) -> Option<NaiveDate> {
        let raw = self.start_date.as_deref()?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
    }

    /// Teaching week `date` falls in: `floor(days_since_start / 7) + 1`.
    ///
    /// None before the term starts, after its last week, or when the start is unknown.
    pub fn week_of(&self, date: NaiveDate) -> Option<u32> {
        let start = self.start()?;
        let days = (date - start).num_days();
        if days < 0 {
            return None;
        }

        let week = u32::try_from(days / 7).ok()? + 1;
        (week <= self.total_weeks).then_some(week)
    }

    pub fn parity_of(&self, date: NaiveDate) -> Option<WeekParity> {
        self.week_of(date).map(WeekParity::of_week)
    }

    pub fn period_table(&self) -> PeriodTable {
        PeriodTable::from_json_or_default(self.period_table.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn week_numbers_count_from_term_start() {
        let term = TermConfig::new(date("2024-09-02"), 16);

        assert_eq!(term.week_of(date("2024-09-01")), None);
        assert_eq!(term.week_of(date("2024-09-02")), Some(1));
        assert_eq!(term.week_of(date("2024-09-08")), Some(1));
        assert_eq!(term.week_of(date("2024-09-09")), Some(2));
        assert_eq!(term.week_of(date("2024-09-18")), Some(3));
        assert_eq!(term.week_of(date("2024-12-22")), Some(16));
        assert_eq!(term.week_of(date("2024-12-23")), None);
    }

    #[test]
    fn parity_alternates_every_week() {
        let term = TermConfig::new(date("2024-09-02"), 16);

        assert_eq!(term.parity_of(date("2024-09-18")), Some(WeekParity::Odd));
        assert_eq!(term.parity_of(date("2024-09-25")), Some(WeekParity::Even));
        assert_eq!(term.parity_of(date("2024-10-02")), Some(WeekParity::Odd));
    }

    #[test]
    fn unset_or_garbled_start_has_no_weeks() {
        let unset = TermConfig::default();
        assert_eq!(unset.week_of(date("2024-09-18")), None);

        let garbled = TermConfig {
            start_date: Some("next monday".into()),
            ..TermConfig::default()
        };
        assert_eq!(garbled.week_of(date("2024-09-18")), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let term: TermConfig = serde_json::from_str(r#"{"startDate":"2024-09-02"}"#).unwrap();
        assert_eq!(term.total_weeks, DEFAULT_TOTAL_WEEKS);
        assert_eq!(term.period_table(), PeriodTable::default());
    }
}

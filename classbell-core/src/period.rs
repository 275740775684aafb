//! Period tables: which clock times a numbered class period occupies.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PERIODS, TIME_FORMAT};
use crate::error::{BellError, BellResult};

/// One row of a period table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeNode {
    pub node: u32,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// Ordered mapping from period index to its start/end clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTable {
    nodes: BTreeMap<u32, TimeNode>,
}

impl PeriodTable {
    pub fn new(nodes: impl IntoIterator<Item = TimeNode>) -> Self {
        PeriodTable {
            nodes: nodes.into_iter().map(|n| (n.node, n)).collect(),
        }
    }

    /// Parse the serialized form stored in a term: a JSON array of time nodes.
    pub fn from_json(json: &str) -> BellResult<Self> {
        let nodes: Vec<TimeNode> =
            serde_json::from_str(json).map_err(|e| BellError::PeriodTable(e.to_string()))?;

        if nodes.is_empty() {
            return Err(BellError::PeriodTable("table has no periods".into()));
        }

        Ok(Self::new(nodes))
    }

    pub fn to_json(&self) -> BellResult<String> {
        let nodes: Vec<&TimeNode> = self.nodes.values().collect();
        serde_json::to_string(&nodes).map_err(|e| BellError::Serialization(e.to_string()))
    }

    /// Parse `json`, falling back to the built-in table when it is missing or corrupt.
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        let Some(json) = json.filter(|j| !j.trim().is_empty()) else {
            return Self::default();
        };

        match Self::from_json(json) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable period table, using built-in default");
                Self::default()
            }
        }
    }

    pub fn get(&self, node: u32) -> Option<&TimeNode> {
        self.nodes.get(&node)
    }

    /// Clock span from the start of `start` to the end of `end`.
    /// None if either period is absent from the table.
    pub fn resolve(&self, start: u32, end: u32) -> Option<(NaiveTime, NaiveTime)> {
        let first = self.nodes.get(&start)?;
        let last = self.nodes.get(&end)?;
        Some((first.start_time, last.end_time))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeNode> {
        self.nodes.values()
    }
}

impl Default for PeriodTable {
    fn default() -> Self {
        Self::new(DEFAULT_PERIODS.iter().filter_map(|(node, start, end)| {
            Some(TimeNode {
                node: *node,
                start_time: NaiveTime::parse_from_str(start, TIME_FORMAT).ok()?,
                end_time: NaiveTime::parse_from_str(end, TIME_FORMAT).ok()?,
            })
        }))
    }
}

/// `HH:MM` (de)serialization for clock times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn default_table_has_twelve_periods() {
        let table = PeriodTable::default();
        assert_eq!(table.len(), 12);
        assert_eq!(table.resolve(1, 2), Some((hm(8, 0), hm(9, 40))));
        assert_eq!(table.resolve(11, 12), Some((hm(20, 50), hm(22, 30))));
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"[
            {"node": 1, "startTime": "07:30", "endTime": "08:15"},
            {"node": 2, "startTime": "08:20", "endTime": "09:05"}
        ]"#;

        let table = PeriodTable::from_json(json).unwrap();
        assert_eq!(table.resolve(1, 2), Some((hm(7, 30), hm(9, 5))));
        assert_eq!(table.resolve(1, 3), None);
    }

    #[test]
    fn corrupt_json_falls_back_to_default() {
        let table = PeriodTable::from_json_or_default(Some("{not json"));
        assert_eq!(table, PeriodTable::default());

        let table = PeriodTable::from_json_or_default(None);
        assert_eq!(table, PeriodTable::default());

        let table = PeriodTable::from_json_or_default(Some("[]"));
        assert_eq!(table, PeriodTable::default());
    }

    #[test]
    fn json_survives_a_save() {
        let table = PeriodTable::default();
        let json = table.to_json().unwrap();
        assert!(json.contains(r#""startTime":"08:00""#));
        assert_eq!(PeriodTable::from_json(&json).unwrap(), table);
    }
}

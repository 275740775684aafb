pub mod config;
pub mod course;
pub mod day;
pub mod event;
pub mod term;
pub mod triggers;

use chrono::{NaiveDate, Utc};
use classbell_core::config::BellConfig;

/// Today's date in the configured timezone.
pub fn today(config: &BellConfig) -> NaiveDate {
    Utc::now().with_timezone(&config.tz()).date_naive()
}

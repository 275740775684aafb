use anyhow::Result;
use chrono::NaiveDate;
use classbell_core::config::BellConfig;
use classbell_core::event::Event;
use classbell_core::expand::ScheduleExpander;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::parse_day;

pub fn run(config: &BellConfig, date: Option<&str>) -> Result<()> {
    let date = parse_day(date, super::today(config))?;
    let store = config.store();

    let term = store.term()?;
    let courses = store.courses()?;
    let events = store.events()?;

    let expander = ScheduleExpander::new(&term);
    let mut entries = expander.expand(date, &courses);
    entries.extend(events.into_iter().filter(|e| occurs_on(e, date)));
    entries.sort_by(|a, b| a.start_time.cmp(&b.start_time));

    let header = date.format("%A %Y-%m-%d").to_string();
    match term.week_of(date) {
        Some(week) => println!(
            "{} {}",
            header.bold(),
            format!("· week {week} ({})", if week % 2 == 1 { "odd" } else { "even" }).dimmed()
        ),
        None => println!("{} {}", header.bold(), "· outside term".dimmed()),
    }

    if entries.is_empty() {
        println!("{}", "  Nothing scheduled".dimmed());
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.render());
    }

    Ok(())
}

/// Whether a one-off event touches `date`.
fn occurs_on(event: &Event, date: NaiveDate) -> bool {
    let Some(start) = event.start_local() else {
        return false;
    };
    let end = event.end_local().unwrap_or(start);
    start.date() <= date && date <= end.date()
}

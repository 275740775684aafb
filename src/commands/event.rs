use anyhow::Result;
use chrono::Duration;
use clap::Subcommand;
use classbell_core::config::BellConfig;
use classbell_core::event::{Event, EventKind};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::{parse_day, parse_time};

#[derive(Subcommand)]
pub enum EventCommand {
    /// Create a one-off event
    New {
        title: String,

        /// Day of the event (YYYY-MM-DD, "today" or "tomorrow")
        #[arg(short, long)]
        date: Option<String>,

        /// Start time (HH:MM)
        #[arg(short, long)]
        start: String,

        /// End time (HH:MM); one hour after start when omitted
        #[arg(short, long)]
        end: Option<String>,

        /// Minutes before start to remind (repeatable)
        #[arg(short, long = "remind")]
        remind: Vec<u32>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        important: bool,

        /// Pickup or delivery code; makes this a pickup entry
        #[arg(long)]
        pickup: Option<String>,

        /// Where the pickup is (with --pickup)
        #[arg(long, requires = "pickup")]
        platform: Option<String>,
    },
    /// List events
    List,
    /// Delete an event
    Delete { id: String },
}

pub fn run(config: &BellConfig, command: EventCommand) -> Result<()> {
    let store = config.store();

    match command {
        EventCommand::New {
            title,
            date,
            start,
            end,
            remind,
            location,
            note,
            important,
            pickup,
            platform,
        } => {
            let day = parse_day(date.as_deref(), super::today(config))?;
            let start = day.and_time(parse_time(&start)?);
            let end = match end {
                Some(e) => {
                    let end = day.and_time(parse_time(&e)?);
                    // An end before the start wraps past midnight.
                    if end < start { end + Duration::days(1) } else { end }
                }
                None => start + Duration::hours(1),
            };

            let mut event = Event::new(title, start, end);
            event.location = location;
            event.description = note;
            event.important = important;
            event.reminders = remind.into_iter().collect();
            if let Some(code) = pickup {
                event.kind = EventKind::Pickup { code, platform };
            }

            let line = event.render();
            store.add_event(event)?;
            println!("{}", "  Created:".green());
            println!("{line}");
        }
        EventCommand::List => {
            let mut events = store.events()?;
            if events.is_empty() {
                println!("{}", "No events".dimmed());
            }
            events.sort_by(|a, b| {
                (&a.start_date, &a.start_time).cmp(&(&b.start_date, &b.start_time))
            });

            let mut current_date: Option<&str> = None;
            for event in &events {
                if current_date != Some(event.start_date.as_str()) {
                    println!("{}", event.start_date.bold());
                    current_date = Some(&event.start_date);
                }
                println!("{} {}", event.render(), event.id.dimmed());
            }
        }
        EventCommand::Delete { id } => {
            let removed = store.delete_event(&id)?;
            println!("{}", format!("  Deleted: {}", removed.title).red());
        }
    }

    Ok(())
}

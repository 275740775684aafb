//! TUI rendering traits for classbell types.

use classbell_core::course::Course;
use classbell_core::event::{Event, EventKind};
use classbell_core::trigger::{Trigger, TriggerKind};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Event {
    fn render(&self) -> String {
        let time = format!("{:>5}-{:<5}", self.start_time, self.end_time);
        let title = if self.important {
            format!("{} !", self.title).bold().to_string()
        } else {
            self.title.clone()
        };

        let mut line = format!("  {} {}", time.cyan(), title);
        if let Some(location) = &self.location {
            line.push_str(&format!(" {}", format!("@ {location}").dimmed()));
        }
        if let EventKind::Pickup { code, platform } = &self.kind {
            let code = match platform {
                Some(p) => format!("[{p} {code}]"),
                None => format!("[{code}]"),
            };
            line.push_str(&format!(" {}", code.yellow()));
        }
        if !self.reminders.is_empty() {
            let minutes: Vec<String> = self.reminders.iter().map(|m| format!("{m}m")).collect();
            line.push_str(&format!(" {}", format!("⏰ {}", minutes.join(",")).dimmed()));
        }
        line
    }
}

impl Render for Course {
    fn render(&self) -> String {
        let when = format!(
            "{} {} · weeks {}-{} ({})",
            weekday_name(self.day_of_week),
            self.period_label(),
            self.start_week,
            self.end_week,
            self.parity
        );
        let mut line = format!("  {} {}", self.name.bold(), when.dimmed());
        if let Some(place) = self.place() {
            line.push_str(&format!(" @ {place}"));
        }
        if !self.excluded_dates.is_empty() {
            line.push_str(&format!(
                " {}",
                format!("(skips {})", self.excluded_dates.len()).yellow()
            ));
        }
        line.push_str(&format!(" {}", self.id.dimmed()));
        line
    }
}

/// One line per trigger, with its instant shown in `tz`.
pub fn trigger_line(trigger: &Trigger, tz: Tz) -> String {
    let at = trigger.at.with_timezone(&tz).format("%a %b %-d %H:%M");
    let kind = match trigger.key.kind {
        TriggerKind::Reminder { .. } => trigger.payload.label.yellow().to_string(),
        TriggerKind::LiveBegin => "live begin".green().to_string(),
        TriggerKind::LiveEnd => "live end".red().to_string(),
    };
    format!("  {} {} {}", at.to_string().cyan(), trigger.payload.title, kind)
}

pub fn weekday_name(day: u32) -> &'static str {
    match day {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        7 => "Sun",
        _ => "???",
    }
}

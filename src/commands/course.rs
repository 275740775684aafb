use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use classbell_core::config::BellConfig;
use classbell_core::course::{Course, WeekParity};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::{parse_day, parse_span, parse_weekday};

#[derive(Clone, Copy, ValueEnum)]
pub enum Parity {
    All,
    Odd,
    Even,
}

impl From<Parity> for WeekParity {
    fn from(p: Parity) -> Self {
        match p {
            Parity::All => WeekParity::None,
            Parity::Odd => WeekParity::Odd,
            Parity::Even => WeekParity::Even,
        }
    }
}

#[derive(Subcommand)]
pub enum CourseCommand {
    /// Add a weekly course
    Add {
        name: String,

        /// Day of week (1-7 or a day name)
        #[arg(short, long)]
        day: String,

        /// Periods, e.g. "3-4"
        #[arg(short, long)]
        periods: String,

        /// Teaching weeks, e.g. "1-16" (defaults to the whole term)
        #[arg(short, long)]
        weeks: Option<String>,

        #[arg(long, value_enum, default_value = "all")]
        parity: Parity,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        teacher: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },
    /// List courses
    List,
    /// Delete a course
    Delete { id: String },
    /// Cancel a single occurrence of a course
    Skip {
        id: String,

        /// Date of the occurrence (YYYY-MM-DD, "today" or "tomorrow")
        #[arg(short, long)]
        date: String,
    },
}

pub fn run(config: &BellConfig, command: CourseCommand) -> Result<()> {
    let store = config.store();

    match command {
        CourseCommand::Add {
            name,
            day,
            periods,
            weeks,
            parity,
            location,
            teacher,
            color,
        } => {
            let weeks = match weeks {
                Some(w) => parse_span(&w)?,
                None => (1, store.term()?.total_weeks),
            };
            let mut course = Course::new(name, parse_weekday(&day)?, parse_span(&periods)?, weeks);
            course.parity = parity.into();
            course.location = location;
            course.teacher = teacher;
            course.color = color.unwrap_or_default();

            let line = course.render();
            store.add_course(course)?;
            println!("{}", "  Added:".green());
            println!("{line}");
        }
        CourseCommand::List => {
            let courses = store.courses()?;
            if courses.is_empty() {
                println!("{}", "No courses".dimmed());
            }
            for course in &courses {
                println!("{}", course.render());
            }
        }
        CourseCommand::Delete { id } => {
            let removed = store.delete_course(&id)?;
            println!("{}", format!("  Deleted: {}", removed.name).red());
        }
        CourseCommand::Skip { id, date } => {
            let date = parse_day(Some(&date), super::today(config))?;
            store.exclude_course_date(&id, date)?;
            println!("{}", format!("  Skipping {id} on {date}").yellow());
        }
    }

    Ok(())
}

mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use classbell_core::config::BellConfig;
use tracing_subscriber::EnvFilter;

use crate::commands::course::CourseCommand;
use crate::commands::event::EventCommand;
use crate::commands::term::TermCommand;

#[derive(Parser)]
#[command(name = "classbell")]
#[command(about = "Manage your class schedule, events and their reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show classes and events of a day
    Day {
        /// Day to show (YYYY-MM-DD, "today" or "tomorrow")
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Manage recurring courses
    Course {
        #[command(subcommand)]
        command: CourseCommand,
    },
    /// Manage one-off events
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Show or change the term
    Term {
        #[command(subcommand)]
        command: TermCommand,
    },
    /// Show the triggers that would be registered right now
    Triggers {
        /// Days of classes to include (defaults to plan_days from config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show configuration paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CLASSBELL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BellConfig::load()?;

    match cli.command {
        Commands::Day { date } => commands::day::run(&config, date.as_deref()),
        Commands::Course { command } => commands::course::run(&config, command),
        Commands::Event { command } => commands::event::run(&config, command),
        Commands::Term { command } => commands::term::run(&config, command),
        Commands::Triggers { days } => commands::triggers::run(&config, days),
        Commands::Config => commands::config::run(&config),
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use classbell_core::config::BellConfig;
use classbell_core::constants::DATE_FORMAT;
use classbell_core::period::PeriodTable;
use classbell_core::term::TermConfig;
use owo_colors::OwoColorize;

use crate::utils::parse_day;

#[derive(Subcommand)]
pub enum TermCommand {
    /// Show the term and its period table
    Show,
    /// Change the term
    Set {
        /// First day of week 1 (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// Number of teaching weeks
        #[arg(short, long)]
        weeks: Option<u32>,

        /// JSON file with the period table
        #[arg(short, long)]
        periods: Option<PathBuf>,
    },
}

pub fn run(config: &BellConfig, command: TermCommand) -> Result<()> {
    let store = config.store();

    match command {
        TermCommand::Show => {
            let term = store.term()?;
            show(&term, super::today(config));
        }
        TermCommand::Set {
            start,
            weeks,
            periods,
        } => {
            let mut term = store.term()?;
            let today = super::today(config);

            if let Some(start) = start {
                let start = parse_day(Some(&start), today)?;
                term.start_date = Some(start.format(DATE_FORMAT).to_string());
            }
            if let Some(weeks) = weeks {
                term.total_weeks = weeks;
            }
            if let Some(path) = periods {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Could not read {}", path.display()))?;
                let table = PeriodTable::from_json(&json)?;
                term = term.with_period_table(&table);
            }

            store.save_term(&term)?;
            println!("{}", "  Term saved".green());
            show(&term, today);
        }
    }

    Ok(())
}

fn show(term: &TermConfig, today: chrono::NaiveDate) {
    match term.start() {
        Some(start) => println!("  Starts {} · {} weeks", start, term.total_weeks),
        None => println!("{}", "  No term start set".yellow()),
    }
    if let Some(week) = term.week_of(today) {
        println!("  Today is in week {week}");
    }

    println!("{}", "Periods".bold());
    for node in term.period_table().iter() {
        println!(
            "  {:>2}  {}-{}",
            node.node,
            node.start_time.format("%H:%M"),
            node.end_time.format("%H:%M")
        );
    }
}

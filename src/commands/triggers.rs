use std::sync::Arc;

use anyhow::Result;
use classbell_core::clock::SystemClock;
use classbell_core::config::BellConfig;
use classbell_core::planner::TriggerPlanner;
use classbell_core::schedule::Scheduler;
use classbell_core::timer::MemoryTimer;
use owo_colors::OwoColorize;

use crate::render::trigger_line;

/// Plan everything upcoming into an in-memory timer and list what it holds.
pub fn run(config: &BellConfig, days: Option<u32>) -> Result<()> {
    let store = config.store();
    let tz = config.tz();

    let timer = Arc::new(MemoryTimer::new());
    let planner = TriggerPlanner::new(timer.clone(), Arc::new(SystemClock), tz)
        .with_live(config.live_activity);
    let mut scheduler = Scheduler::new(
        planner,
        config.course_reminders.clone(),
        days.unwrap_or(config.plan_days),
    );

    let upcoming = scheduler.upcoming(
        &store.courses()?,
        &store.events()?,
        &store.term()?,
        super::today(config),
    );
    let report = scheduler.sync(upcoming);

    let pending = timer.pending();
    if pending.is_empty() {
        println!("{}", "No upcoming triggers".dimmed());
        return Ok(());
    }

    for trigger in &pending {
        println!("{}", trigger_line(trigger, tz));
    }
    println!(
        "{}",
        format!(
            "{} triggers for {} events ({} already past)",
            report.triggers.registered, report.planned, report.triggers.skipped
        )
        .dimmed()
    );

    Ok(())
}

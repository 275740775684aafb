use anyhow::Result;
use classbell_core::config::BellConfig;
use owo_colors::OwoColorize;

pub fn run(config: &BellConfig) -> Result<()> {
    let config_path = BellConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Data:       {}", config.data_path().display());

    println!("{}", "Scheduling".bold());
    println!("  Timezone:   {}", config.tz());
    println!("  Reminders:  {:?} minutes before class", config.course_reminders);
    println!("  Plan ahead: {} day(s)", config.plan_days);
    println!(
        "  Live:       {}",
        if config.live_activity { "on" } else { "off" }
    );

    Ok(())
}

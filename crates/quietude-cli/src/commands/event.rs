//! Scheduled event management.

use clap::Subcommand;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use quietude_core::EnergyEngine;

#[derive(Subcommand)]
pub enum EventAction {
    /// Schedule an energy-depleting event
    Add {
        /// Event name
        name: String,
        /// Start time (RFC3339 or "YYYY-MM-DD HH:MM" local time)
        #[arg(long)]
        at: String,
        /// Battery percentage drained at the start time, 1-100
        #[arg(long)]
        cost: u8,
    },
    /// List scheduled events
    List,
}

fn parse_start_time(input: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("invalid time: '{input}'. Use RFC3339 or \"YYYY-MM-DD HH:MM\""))?;
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            Ok(dt.with_timezone(&Utc))
        }
        chrono::LocalResult::None => Err(format!("invalid local time: '{input}'").into()),
    }
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        EventAction::Add { name, at, cost } => {
            let starts_at = parse_start_time(&at)?;
            let mut engine = EnergyEngine::open()?;
            let event = engine.schedule_event(name, starts_at, cost)?;

            println!(
                "Scheduled '{}' at {} (-{}%)",
                event.name,
                event.starts_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                event.energy_cost
            );
            if event.starts_at <= Utc::now() {
                println!("  Already due: energy will be depleted on the next check");
            }
            Ok(())
        }
        EventAction::List => {
            let engine = EnergyEngine::open()?;
            let events = engine.events()?;
            if events.is_empty() {
                println!("No scheduled events");
                return Ok(());
            }
            for event in events {
                let marker = if event.consumed { "✓" } else { " " };
                println!(
                    "{} {}  -{:<3}% {}",
                    marker,
                    event.starts_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    event.energy_cost,
                    event.name
                );
            }
            Ok(())
        }
    }
}

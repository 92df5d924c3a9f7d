//! Battery history display.

use clap::Subcommand;
use chrono::Local;

use quietude_core::EnergyEngine;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List history entries
    List {
        /// Show only the newest N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Render the history as an ASCII chart
    Chart {
        /// Number of entries to chart
        #[arg(long, default_value = "24")]
        limit: usize,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List { limit } => {
            let engine = EnergyEngine::open()?;
            let history = engine.history(limit)?;
            if history.is_empty() {
                println!("No history yet");
                return Ok(());
            }
            for entry in history {
                println!(
                    "{}  {:>4}  ({:?})",
                    entry
                        .recorded_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M"),
                    entry.level.to_string(),
                    entry.trigger
                );
            }
            Ok(())
        }
        HistoryAction::Chart { limit } => {
            let engine = EnergyEngine::open()?;
            let history = engine.history(Some(limit))?;
            if history.is_empty() {
                println!("No history yet");
                return Ok(());
            }

            println!("\nBattery History:");
            println!("{}", "─".repeat(50));
            for entry in &history {
                let bar_length = (entry.level.value() as usize * 30) / 100;
                let bar = "█".repeat(bar_length);
                let empty = " ".repeat(30 - bar_length);
                println!(
                    "{} {}{} {:>4}",
                    entry.recorded_at.with_timezone(&Local).format("%m-%d %H:%M"),
                    bar,
                    empty,
                    entry.level.to_string()
                );
            }
            println!("{}", "─".repeat(50));

            let current = engine.level();
            println!("Current: {} ({})", current, engine.status().message());
            Ok(())
        }
    }
}

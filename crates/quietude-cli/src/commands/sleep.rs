//! Sleep quality recording.

use clap::Subcommand;
use chrono::Local;

use quietude_core::{EnergyEngine, SleepQuality};

#[derive(Subcommand)]
pub enum SleepAction {
    /// Record last night's sleep quality (good, medium, or bad)
    Record {
        /// Sleep quality tier
        quality: String,
    },
    /// Show the sleep audit log
    Log,
}

pub fn run(action: SleepAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SleepAction::Record { quality } => {
            let quality = SleepQuality::parse(&quality)
                .ok_or_else(|| format!("invalid quality: '{quality}'. Use good, medium, or bad"))?;

            let mut engine = EnergyEngine::open()?;
            let record = engine.record_sleep_quality(quality)?;

            if record.applied_delta >= 0 {
                println!(
                    "{} sleep recorded: battery recharged by {}%, now at {}",
                    quality.label(),
                    record.applied_delta,
                    engine.level()
                );
            } else {
                println!(
                    "{} sleep recorded: battery reduced by {}%, now at {}",
                    quality.label(),
                    record.applied_delta.unsigned_abs(),
                    engine.level()
                );
            }
            Ok(())
        }
        SleepAction::Log => {
            let engine = EnergyEngine::open()?;
            let log = engine.sleep_log()?;
            if log.is_empty() {
                println!("No sleep records yet");
                return Ok(());
            }
            for record in log {
                println!(
                    "{}  {:<6} {:+}%",
                    record.recorded_at.with_timezone(&Local).format("%Y-%m-%d"),
                    record.quality.label(),
                    record.applied_delta
                );
            }
            Ok(())
        }
    }
}

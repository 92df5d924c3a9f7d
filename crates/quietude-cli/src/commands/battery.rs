//! Battery command for inspecting and mutating the energy level.

use clap::Subcommand;
use chrono::Local;

use quietude_core::{Activity, ActivityKind, EnergyEngine};

#[derive(Subcommand)]
pub enum BatteryAction {
    /// Show the current battery level and status
    Show,
    /// Set the battery level directly (the slider)
    Set {
        /// Target level, 0-100
        level: i64,
    },
    /// Log a recharging activity
    Recharge {
        /// Activity name
        name: String,
        /// Energy gained, 1-100
        #[arg(long)]
        amount: u8,
        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u32,
    },
    /// Log a depleting activity
    Deplete {
        /// Activity name
        name: String,
        /// Energy lost, 1-100
        #[arg(long)]
        amount: u8,
        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u32,
    },
}

pub fn run(action: BatteryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BatteryAction::Show => show_battery(),
        BatteryAction::Set { level } => {
            let mut engine = EnergyEngine::open()?;
            let change = engine.set_level(level)?;
            if change.clamped {
                println!(
                    "Battery set to {} (requested {} was clamped)",
                    change.applied, change.requested
                );
            } else {
                println!("Battery set to {}", change.applied);
            }
            Ok(())
        }
        BatteryAction::Recharge {
            name,
            amount,
            duration,
        } => log_activity(Activity::new(name, ActivityKind::Recharge, amount, duration)),
        BatteryAction::Deplete {
            name,
            amount,
            duration,
        } => log_activity(Activity::new(name, ActivityKind::Depletion, amount, duration)),
    }
}

fn log_activity(activity: Activity) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = EnergyEngine::open()?;
    let applied = engine.log_activity(activity)?;

    let verb = match applied.activity.kind {
        ActivityKind::Recharge => "recharged",
        ActivityKind::Depletion => "depleted",
    };
    println!(
        "Battery {} by {}%: now at {}",
        verb, applied.activity.energy_delta, applied.change.applied
    );
    if applied.change.clamped {
        println!("  (clamped at the battery bounds)");
    }
    Ok(())
}

fn render_bar(level: u8) -> String {
    let filled = (level as usize * 30) / 100;
    format!("[{}{}]", "█".repeat(filled), " ".repeat(30 - filled))
}

fn show_battery() -> Result<(), Box<dyn std::error::Error>> {
    let engine = EnergyEngine::open()?;
    let level = engine.level();

    println!("\nSocial Battery");
    println!("{}", "─".repeat(50));
    println!("  {} {}", render_bar(level.value()), level);
    println!("  {}", engine.status().message());
    println!("{}", "─".repeat(50));

    if let Some(day) = engine.last_recharge_date() {
        println!("  Last overnight recharge check: {day}");
    }
    match engine.next_due() {
        Some(due) => println!(
            "  Next scheduled event due: {}",
            due.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("  No pending scheduled events"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_tracks_level() {
        assert_eq!(render_bar(0), format!("[{}]", " ".repeat(30)));
        assert_eq!(render_bar(100), format!("[{}]", "█".repeat(30)));
        assert!(render_bar(50).contains(&"█".repeat(15)));
    }
}

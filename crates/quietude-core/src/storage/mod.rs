mod battery_db;
mod config;

pub use battery_db::BatteryDb;
pub use config::{BatteryConfig, Config, RechargeConfig, ReconcilerConfig};

use std::path::PathBuf;

/// Returns `~/.config/quietude[-dev]/` based on QUIETUDE_ENV.
///
/// Set QUIETUDE_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUIETUDE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quietude-dev")
    } else {
        base_dir.join("quietude")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

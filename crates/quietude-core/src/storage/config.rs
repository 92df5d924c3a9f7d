//! TOML-based engine configuration.
//!
//! Stores the tunable knobs of the battery engine:
//! - History threshold and retention
//! - Overnight recharge amount and blocking window
//! - Reconciler interval and consumed-event retention
//!
//! Configuration is stored at `~/.config/quietude/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Battery history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// First-run level.
    #[serde(default = "default_baseline_level")]
    pub baseline_level: u8,
    /// Minimum absolute change for an unforced history snapshot.
    #[serde(default = "default_history_threshold")]
    pub history_threshold: u8,
    /// History entries kept before the oldest are pruned.
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,
}

/// Overnight recharge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeConfig {
    /// Passive recharge applied after an event-free night.
    #[serde(default = "default_recharge_amount")]
    pub amount: u8,
}

/// Scheduled-event reconciler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds between reconciler ticks while the engine is active.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Consumed events older than this are purged when the store opens.
    #[serde(default = "default_purge_days")]
    pub purge_consumed_after_days: u32,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/quietude/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub recharge: RechargeConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

// Default functions
fn default_baseline_level() -> u8 {
    crate::battery::EnergyLevel::BASELINE.value()
}
fn default_history_threshold() -> u8 {
    5
}
fn default_history_max_entries() -> usize {
    500
}
fn default_recharge_amount() -> u8 {
    crate::battery::OVERNIGHT_RECHARGE
}
fn default_interval_secs() -> u64 {
    60
}
fn default_purge_days() -> u32 {
    30
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            baseline_level: default_baseline_level(),
            history_threshold: default_history_threshold(),
            history_max_entries: default_history_max_entries(),
        }
    }
}

impl Default for RechargeConfig {
    fn default() -> Self {
        Self {
            amount: default_recharge_amount(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            purge_consumed_after_days: default_purge_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            battery: BatteryConfig::default(),
            recharge: RechargeConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.battery.baseline_level, 70);
        assert_eq!(parsed.recharge.amount, 50);
        assert_eq!(parsed.reconciler.interval_secs, 60);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("battery.history_threshold").as_deref(), Some("5"));
        assert_eq!(cfg.get("reconciler.interval_secs").as_deref(), Some("60"));
        assert!(cfg.get("battery.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "recharge.amount", "25").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "recharge.amount").unwrap(),
            &serde_json::Value::Number(25.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "battery.nonexistent", "1");
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[battery]\nhistory_threshold = 10\n").unwrap();
        assert_eq!(parsed.battery.history_threshold, 10);
        assert_eq!(parsed.battery.baseline_level, 70);
        assert_eq!(parsed.reconciler.purge_consumed_after_days, 30);
    }
}

use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} has an unreadable value '{value}'")]
    Unreadable { key: &'static str, value: String },
    #[error("{key} must be {expected}, got '{value}'")]
    OutOfRange {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tick_rate: f32,           // Ticks per second.
    pub snapshot_interval: u32,   // Ticks between snapshots.
    pub interpolation_delay: u32, // Ticks the rendered view trails the simulation.
    pub drop_rate: f64,           // Probability that a snapshot is lost.
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            snapshot_interval: 3,
            interpolation_delay: 6,
            drop_rate: 0.1,
        }
    }
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let tick_rate = read(&lookup, "TICK_RATE", defaults.tick_rate)?;
        if !(tick_rate.is_finite() && tick_rate > 0.0) {
            return Err(out_of_range("TICK_RATE", tick_rate, "a positive number"));
        }

        let snapshot_interval = read(&lookup, "SNAPSHOT_INTERVAL", defaults.snapshot_interval)?;
        if snapshot_interval == 0 {
            return Err(out_of_range("SNAPSHOT_INTERVAL", snapshot_interval, "at least 1"));
        }

        let interpolation_delay =
            read(&lookup, "INTERPOLATION_DELAY", defaults.interpolation_delay)?;

        let drop_rate = read(&lookup, "SNAPSHOT_DROP_RATE", defaults.drop_rate)?;
        if !(0.0..1.0).contains(&drop_rate) {
            return Err(out_of_range("SNAPSHOT_DROP_RATE", drop_rate, "in [0, 1)"));
        }

        Ok(Self {
            tick_rate,
            snapshot_interval,
            interpolation_delay,
            drop_rate,
        })
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
    }
}

fn read<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Unreadable {
            key,
            value: value.clone(),
        }),
    }
}

fn out_of_range(key: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        key,
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        assert_eq!(config_from(&[]), Ok(Config::default()));
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("TICK_RATE", "30"),
            ("SNAPSHOT_INTERVAL", " 5 "),
            ("INTERPOLATION_DELAY", "10"),
            ("SNAPSHOT_DROP_RATE", "0.5"),
        ])
        .expect("valid configuration");

        assert_eq!(config.tick_rate, 30.0);
        assert_eq!(config.snapshot_interval, 5);
        assert_eq!(config.interpolation_delay, 10);
        assert_eq!(config.drop_rate, 0.5);
    }

    #[test]
    fn unreadable_values_are_errors() {
        assert_eq!(
            config_from(&[("SNAPSHOT_INTERVAL", "often")]),
            Err(ConfigError::Unreadable {
                key: "SNAPSHOT_INTERVAL",
                value: "often".to_string()
            })
        );
    }

    #[test]
    fn out_of_range_values_are_errors() {
        assert!(config_from(&[("TICK_RATE", "0")]).is_err());
        assert!(config_from(&[("TICK_RATE", "NaN")]).is_err());
        assert!(config_from(&[("SNAPSHOT_INTERVAL", "0")]).is_err());
        assert!(config_from(&[("SNAPSHOT_DROP_RATE", "1.0")]).is_err());
        assert!(config_from(&[("SNAPSHOT_DROP_RATE", "-0.1")]).is_err());
    }

    #[test]
    fn tick_duration_follows_tick_rate() {
        let config = Config {
            tick_rate: 50.0,
            ..Config::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_millis(20));
    }
}

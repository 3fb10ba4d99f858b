use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use sweep_engine::{HISTORY_LIMIT, PurgeConfig};
use sweep_types::UserId;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub operators: HashSet<UserId>,
    pub command_prefix: String,
    pub purge: PurgeConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = parse("SWEEP_PORT", get("SWEEP_PORT", "3000"))?;
        let raw_limit = get("SWEEP_HISTORY_LIMIT", &HISTORY_LIMIT.to_string());
        let history_limit: usize = parse("SWEEP_HISTORY_LIMIT", raw_limit.clone())?;
        // The platform never returns more than one page of HISTORY_LIMIT.
        if !(1..=HISTORY_LIMIT).contains(&history_limit) {
            return Err(ConfigError::Invalid {
                key: "SWEEP_HISTORY_LIMIT",
                value: raw_limit,
            });
        }
        let delete_delay_ms: u64 = parse("SWEEP_DELETE_DELAY_MS", get("SWEEP_DELETE_DELAY_MS", "0"))?;

        let operators = get("SWEEP_OPERATORS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<UserId>().map_err(|_| ConfigError::Invalid {
                    key: "SWEEP_OPERATORS",
                    value: s.to_string(),
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;

        let command_prefix = get("SWEEP_COMMAND_PREFIX", "?");
        if command_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SWEEP_COMMAND_PREFIX",
                value: command_prefix,
            });
        }

        Ok(Self {
            host: get("SWEEP_HOST", "0.0.0.0"),
            port,
            db_path: get("SWEEP_DB_PATH", "sweep.db"),
            jwt_secret: get("SWEEP_JWT_SECRET", DEV_JWT_SECRET),
            operators,
            command_prefix,
            purge: PurgeConfig {
                history_limit,
                delete_delay: Duration::from_millis(delete_delay_ms),
            },
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.operators.is_empty());
        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.purge.history_limit, 2000);
        assert!(config.purge.delete_delay.is_zero());
    }

    #[test]
    fn reads_operators_and_pacing() {
        let config = Config::from_lookup(lookup(&[
            ("SWEEP_OPERATORS", "480968489654288387, 951477324388372561,"),
            ("SWEEP_DELETE_DELAY_MS", "250"),
            ("SWEEP_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.operators.len(), 2);
        assert!(config.operators.contains(&UserId(480968489654288387)));
        assert_eq!(config.purge.delete_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("SWEEP_OPERATORS", "12,bob")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "SWEEP_OPERATORS",
                value: "bob".into()
            }
        );

        assert!(Config::from_lookup(lookup(&[("SWEEP_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SWEEP_COMMAND_PREFIX", " ")])).is_err());
    }

    #[test]
    fn history_limit_stays_within_one_page() {
        let err = Config::from_lookup(lookup(&[("SWEEP_HISTORY_LIMIT", "50000")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "SWEEP_HISTORY_LIMIT",
                value: "50000".into()
            }
        );
        assert!(Config::from_lookup(lookup(&[("SWEEP_HISTORY_LIMIT", "0")])).is_err());

        let config = Config::from_lookup(lookup(&[("SWEEP_HISTORY_LIMIT", "500")])).unwrap();
        assert_eq!(config.purge.history_limit, 500);
        let config = Config::from_lookup(lookup(&[("SWEEP_HISTORY_LIMIT", "2000")])).unwrap();
        assert_eq!(config.purge.history_limit, HISTORY_LIMIT);
    }
}

//! Server configuration from environment variables.

use crate::engine::DEFAULT_MAX_COMMIT_ATTEMPTS;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON snapshot loaded into the store at start-up.
    pub seed_file: Option<PathBuf>,
    pub max_commit_attempts: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            seed_file: None,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    /// HOST, PORT, SEED_FILE, MAX_COMMIT_ATTEMPTS (after loading `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = match lookup("PORT") {
            Some(raw) => parse("PORT", &raw)?,
            None => defaults.port,
        };
        let seed_file = lookup("SEED_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let max_commit_attempts = match lookup("MAX_COMMIT_ATTEMPTS") {
            Some(raw) => match parse::<usize>("MAX_COMMIT_ATTEMPTS", &raw)? {
                0 => {
                    return Err(ConfigError::InvalidValue {
                        var: "MAX_COMMIT_ATTEMPTS",
                        value: raw,
                    })
                }
                n => n,
            },
            None => defaults.max_commit_attempts,
        };
        Ok(Self {
            host,
            port,
            seed_file,
            max_commit_attempts,
        })
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[])).unwrap(), ServerConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("SEED_FILE", "seed.json"),
            ("MAX_COMMIT_ATTEMPTS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.seed_file, Some(PathBuf::from("seed.json")));
        assert_eq!(cfg.max_commit_attempts, 5);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[("MAX_COMMIT_ATTEMPTS", "0")])),
            Err(ConfigError::InvalidValue {
                var: "MAX_COMMIT_ATTEMPTS",
                value: "0".to_string()
            })
        );
    }
}

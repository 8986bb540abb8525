use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::infrastructure::sqlite_auth::DEFAULT_SESSION_TTL_HOURS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TODOS_ADDR `{value}` is not a socket address: {source}")]
    InvalidAddr { value: String, source: std::net::AddrParseError },
    #[error("TODOS_SESSION_TTL_HOURS `{value}` is not a positive number of hours")]
    InvalidTtl { value: String },
}

/// Runtime settings, read from the environment after `.env` has been loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    pub session_file: PathBuf,
    pub log_file: PathBuf,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://todos.db".to_string());
        let addr_str = lookup("TODOS_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let addr = addr_str
            .parse()
            .map_err(|source| ConfigError::InvalidAddr { value: addr_str.clone(), source })?;
        let session_file = lookup("TODOS_SESSION_FILE").unwrap_or_else(|| ".todos-session".to_string()).into();
        let log_file = lookup("TODOS_LOG_FILE").unwrap_or_else(|| "todos-tui.log".to_string()).into();
        let session_ttl_hours = match lookup("TODOS_SESSION_TTL_HOURS") {
            None => DEFAULT_SESSION_TTL_HOURS,
            Some(value) => match value.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => return Err(ConfigError::InvalidTtl { value }),
            },
        };
        Ok(Self { database_url, addr, session_file, log_file, session_ttl_hours })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, "sqlite://todos.db");
        assert_eq!(config.addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.session_file, PathBuf::from(".todos-session"));
        assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
    }

    #[test]
    fn session_ttl_must_be_positive() {
        let config = Config::from_lookup(|k| (k == "TODOS_SESSION_TTL_HOURS").then(|| "12".to_string())).unwrap();
        assert_eq!(config.session_ttl_hours, 12);
        for bad in ["0", "-3", "soon"] {
            let err = Config::from_lookup(|k| (k == "TODOS_SESSION_TTL_HOURS").then(|| bad.to_string())).unwrap_err();
            assert!(err.to_string().contains(bad));
        }
    }

    #[test]
    fn overrides_and_bad_addr() {
        let env: HashMap<&str, &str> = [("DATABASE_URL", "sqlite::memory:"), ("TODOS_ADDR", "0.0.0.0:8080")].into();
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.addr.port(), 8080);

        let err = Config::from_lookup(|k| (k == "TODOS_ADDR").then(|| "nope".to_string())).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}

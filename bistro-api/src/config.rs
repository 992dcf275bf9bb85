use std::net::SocketAddr;
use std::time::Duration;

use chrono::TimeDelta;

/// Upper bound for `ACCESS_TOKEN_TTL_HOURS` (30 days).
pub const MAX_ACCESS_TOKEN_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub bind_addr: SocketAddr,
    pub db_pool_size: u32,
    /// `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub access_token_ttl: TimeDelta,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            secret_key: required("SECRET_KEY")?,
            bind_addr: parse_var(&lookup, "BIND_ADDR", "0.0.0.0:8100", |v| v.parse().ok())?,
            db_pool_size: parse_var(&lookup, "DB_POOL_SIZE", "10", |v| {
                v.parse::<u32>().ok().filter(|n| *n > 0)
            })?,
            cors_allowed_origins,
            access_token_ttl: parse_var(&lookup, "ACCESS_TOKEN_TTL_HOURS", "8", |v| {
                v.parse::<i64>()
                    .ok()
                    .filter(|h| (1..=MAX_ACCESS_TOKEN_TTL_HOURS).contains(h))
                    .and_then(TimeDelta::try_hours)
            })?,
            rate_limit_window: parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS", "60", |v| {
                v.parse::<u64>().ok().filter(|s| *s > 0).map(Duration::from_secs)
            })?,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    parse(value.trim()).ok_or(ConfigError::Invalid { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bistro"),
            ("SECRET_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8100".parse().unwrap());
        assert_eq!(config.db_pool_size, 10);
        assert_eq!(config.cors_allowed_origins, None);
        assert_eq!(config.access_token_ttl, TimeDelta::hours(8));
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SECRET_KEY"));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("SECRET_KEY", "s"),
            ("DB_POOL_SIZE", "zero"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_POOL_SIZE", .. }));

        for ttl in ["9999999999999", "721", "0", "eight"] {
            let err = Config::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("SECRET_KEY", "s"),
                ("ACCESS_TOKEN_TTL_HOURS", ttl),
            ]))
            .unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    key: "ACCESS_TOKEN_TTL_HOURS",
                    value: ttl.to_string(),
                }
            );
        }

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("SECRET_KEY", "s"),
            ("ACCESS_TOKEN_TTL_HOURS", "720"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_ttl, TimeDelta::days(30));
    }

    #[test]
    fn test_cors_origins() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("SECRET_KEY", "s"),
            ("CORS_ALLOWED_ORIGINS", "https://bistro.example, http://localhost:5173,"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins.unwrap(),
            vec!["https://bistro.example", "http://localhost:5173"]
        );
    }
}

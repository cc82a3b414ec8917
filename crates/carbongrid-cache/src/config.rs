//! Environment configuration for the cache poller.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Zones polled when `ZONES` is unset: the five US grid operators the
/// cache was originally deployed against.
pub const DEFAULT_ZONES: [&str; 5] = [
    "US-CAL-CISO",
    "US-TEX-ERCO",
    "US-NY-NYIS",
    "US-MIDA-PJM",
    "US-MIDW-MISO",
];

pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 5;
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 10;
pub const DEFAULT_CACHE_FILE: &str = "/cache/carbon_cache.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The one fatal startup condition: no API key, no poller.
    #[error("ELECTRICITY_MAPS_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Poller configuration, sourced from environment variables.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub api_key: String,
    pub poll_interval_minutes: u64,
    pub cache_ttl_minutes: i64,
    pub cache_file: PathBuf,
    pub zones: Vec<String>,
}

impl CacheConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function, so tests never
    /// touch process-wide state. Empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = lookup("ELECTRICITY_MAPS_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let poll_interval_minutes = parse_or(
            lookup("POLL_INTERVAL_MINUTES"),
            "POLL_INTERVAL_MINUTES",
            DEFAULT_POLL_INTERVAL_MINUTES,
        )?;
        let cache_ttl_minutes = parse_or(
            lookup("CACHE_TTL_MINUTES"),
            "CACHE_TTL_MINUTES",
            DEFAULT_CACHE_TTL_MINUTES,
        )?;

        let cache_file = lookup("CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

        let zones = match lookup("ZONES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
        };

        Ok(Self {
            api_key,
            poll_interval_minutes,
            cache_ttl_minutes,
            cache_file,
            zones,
        })
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config_from(entries: &[(&str, &str)]) -> Result<CacheConfig, ConfigError> {
        let env = env_of(entries);
        CacheConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn empty_api_key_counts_as_unset() {
        let err = config_from(&[("ELECTRICITY_MAPS_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = config_from(&[("ELECTRICITY_MAPS_API_KEY", "secret")]).unwrap();

        assert_eq!(config.poll_interval_minutes, 5);
        assert_eq!(config.cache_ttl_minutes, 10);
        assert_eq!(config.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(config.zones, DEFAULT_ZONES);
    }

    #[test]
    fn zones_list_is_split_and_trimmed() {
        let config = config_from(&[
            ("ELECTRICITY_MAPS_API_KEY", "secret"),
            ("ZONES", " FR-FR , DE-DE ,, NO-NO1 "),
        ])
        .unwrap();

        assert_eq!(config.zones, ["FR-FR", "DE-DE", "NO-NO1"]);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("ELECTRICITY_MAPS_API_KEY", "secret"),
            ("POLL_INTERVAL_MINUTES", "15"),
            ("CACHE_TTL_MINUTES", "30"),
            ("CACHE_FILE", "/tmp/cache.json"),
        ])
        .unwrap();

        assert_eq!(config.poll_interval_minutes, 15);
        assert_eq!(config.cache_ttl_minutes, 30);
        assert_eq!(config.cache_file, PathBuf::from("/tmp/cache.json"));
    }

    #[test]
    fn garbage_interval_is_rejected() {
        let err = config_from(&[
            ("ELECTRICITY_MAPS_API_KEY", "secret"),
            ("POLL_INTERVAL_MINUTES", "soon"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "POLL_INTERVAL_MINUTES",
                ..
            }
        ));
    }
}

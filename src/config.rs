// config.rs - Configuration read from the environment
//
// Two knobs matter for the reproduction:
// - QUERY_BATCH_SIZE: how many ids a single IN chunk may carry
// - IS_DATABASE_BUGGED: which expectation suite runs
//
// Both are read once and then passed around explicitly. Tests that want a
// different batch size scope it on the store (see Store::override_query_batch_size)
// instead of touching the process environment.

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::ConfigError;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const QUERY_BATCH_SIZE: &str = "QUERY_BATCH_SIZE";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const IS_DATABASE_BUGGED: &str = "IS_DATABASE_BUGGED";

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_QUERY_BATCH_SIZE: usize = 5000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection and query settings for a [`crate::Store`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    /// Upper bound on ids per IN chunk. Clamped to the driver bind limit at query time.
    pub query_batch_size: usize,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            query_batch_size: DEFAULT_QUERY_BATCH_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl StoreConfig {
    /// Load the configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset variables fall back to their defaults; set but malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL).filter(|url| !url.trim().is_empty()) {
            config.database_url = url;
        }

        if let Some(raw) = lookup(QUERY_BATCH_SIZE) {
            config.query_batch_size = parse_positive(QUERY_BATCH_SIZE, &raw)?;
        }

        if let Some(raw) = lookup(DATABASE_MAX_CONNECTIONS) {
            let value = parse_positive(DATABASE_MAX_CONNECTIONS, &raw)?;
            config.max_connections = u32::try_from(value).map_err(|_| ConfigError::Invalid {
                key: DATABASE_MAX_CONNECTIONS,
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }

    /// Set a different database URL, keeping everything else
    /// In-memory databases disappear with their last connection
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Zero { key }),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Which expectation suite is active for this process.
///
/// `Bugged` models a store that silently drops results once a read carries
/// 1000 or more ids; `Stable` expects the full result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    Bugged,
    Stable,
}

impl Expectation {
    /// Only the literal `"1"` turns the bugged suite on
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some("1") => Expectation::Bugged,
            _ => Expectation::Stable,
        }
    }

    /// The expectation for this process, read from `IS_DATABASE_BUGGED` on first use
    pub fn current() -> Self {
        static CURRENT: OnceLock<Expectation> = OnceLock::new();

        *CURRENT.get_or_init(|| {
            dotenv::dotenv().ok();
            let expectation = Self::from_flag(env::var(IS_DATABASE_BUGGED).ok().as_deref());
            tracing::info!(?expectation, "selected expectation suite");
            expectation
        })
    }

    pub fn is_bugged(self) -> bool {
        self == Expectation::Bugged
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Bugged => write!(f, "bugged database"),
            Expectation::Stable => write!(f, "stable database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.query_batch_size, DEFAULT_QUERY_BATCH_SIZE);
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DATABASE_URL, "sqlite://repro.db"),
            (QUERY_BATCH_SIZE, "1000"),
            (DATABASE_MAX_CONNECTIONS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite://repro.db");
        assert_eq!(config.query_batch_size, 1000);
        assert_eq!(config.max_connections, 3);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_rejects_bad_batch_size() {
        let err = StoreConfig::from_lookup(lookup_from(&[(QUERY_BATCH_SIZE, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: QUERY_BATCH_SIZE, .. }));

        let err = StoreConfig::from_lookup(lookup_from(&[(QUERY_BATCH_SIZE, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Zero { key: QUERY_BATCH_SIZE }));
    }

    #[test]
    fn test_blank_database_url_uses_default() {
        let config = StoreConfig::from_lookup(lookup_from(&[(DATABASE_URL, "  ")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_expectation_flag() {
        assert_eq!(Expectation::from_flag(Some("1")), Expectation::Bugged);
        assert_eq!(Expectation::from_flag(Some("0")), Expectation::Stable);
        assert_eq!(Expectation::from_flag(Some("true")), Expectation::Stable);
        assert_eq!(Expectation::from_flag(Some(" 1")), Expectation::Stable);
        assert_eq!(Expectation::from_flag(None), Expectation::Stable);
    }
}

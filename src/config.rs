use anyhow::{bail, Result};
use std::env;
use std::str::FromStr;

use crate::models::Namespace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown STORE_BACKEND '{}', expected 'mongo' or 'memory'", other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub server_address: String,
    pub find_namespace: Namespace,
    pub bulk_namespace: Namespace,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub store_backend: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            server_address: "0.0.0.0:8000".to_string(),
            find_namespace: Namespace::new("apitest", "v1"),
            bulk_namespace: Namespace::new("somedb", "somecol"),
            max_pool_size: 10,
            min_pool_size: 0,
            store_backend: StoreBackend::Mongo,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u32| {
            lookup(key)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.store_backend,
        };

        Ok(Config {
            mongodb_uri: text("MONGODB_URI", &defaults.mongodb_uri),
            server_address: text("SERVER_ADDRESS", &defaults.server_address),
            find_namespace: Namespace::new(
                text("FIND_DATABASE", &defaults.find_namespace.database),
                text("FIND_COLLECTION", &defaults.find_namespace.collection),
            ),
            bulk_namespace: Namespace::new(
                text("BULK_DATABASE", &defaults.bulk_namespace.database),
                text("BULK_COLLECTION", &defaults.bulk_namespace.collection),
            ),
            max_pool_size: number("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size),
            min_pool_size: number("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size),
            store_backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.find_namespace, Namespace::new("apitest", "v1"));
        assert_eq!(config.bulk_namespace, Namespace::new("somedb", "somecol"));
        assert_eq!(config.store_backend, StoreBackend::Mongo);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://db:27018"),
            ("FIND_DATABASE", "titanic"),
            ("FIND_COLLECTION", "guests"),
            ("MONGODB_MAX_POOL_SIZE", "25"),
            ("STORE_BACKEND", "Memory"),
        ]))
        .unwrap();

        assert_eq!(config.mongodb_uri, "mongodb://db:27018");
        assert_eq!(config.find_namespace, Namespace::new("titanic", "guests"));
        assert_eq!(config.max_pool_size, 25);
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn bad_numbers_fall_back_and_bad_backends_fail() {
        let config = Config::from_lookup(lookup(&[("MONGODB_MIN_POOL_SIZE", "lots")])).unwrap();
        assert_eq!(config.min_pool_size, 0);

        assert!(Config::from_lookup(lookup(&[("STORE_BACKEND", "postgres")])).is_err());
    }
}

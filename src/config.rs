use std::env;

use derive_more::{Display, Error};
use dotenv::dotenv;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const ACCESS_TOKEN_TTL_SECS: usize = 60 * 60;
const REFRESH_TOKEN_TTL_SECS: usize = 5 * 24 * 60 * 60;

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display(fmt = "environment variable '{}' must be set", name)]
    Missing { name: &'static str },

    #[display(fmt = "environment variable '{}' is invalid: {}", name, reason)]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct FederatedConfig {
    pub secret: String,
    pub issuer: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub federated: Option<FederatedConfig>,
    pub bootstrap_admins: Vec<String>,
}

impl Config {
    /// Reads `.env` (when present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing { name });

        let store = match lookup("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    reason: format!("unknown backend '{other}'"),
                })
            }
        };

        let federated = match (lookup("FEDERATED_TOKEN_SECRET"), lookup("FEDERATED_ISSUER")) {
            (Some(secret), Some(issuer)) => Some(FederatedConfig { secret, issuer }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "FEDERATED_ISSUER",
                    reason: "FEDERATED_TOKEN_SECRET and FEDERATED_ISSUER go together".to_string(),
                })
            }
        };

        let bootstrap_admins = lookup("BOOTSTRAP_ADMINS")
            .map(|raw| {
                raw.split(',')
                    .map(|email| email.trim().to_lowercase())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            store,
            access_secret: required("JWT_ACCESS_SECRET")?,
            refresh_secret: required("JWT_REFRESH_SECRET")?,
            access_token_ttl: parse_secs(&lookup, "ACCESS_TOKEN_TTL_SECS", ACCESS_TOKEN_TTL_SECS)?,
            refresh_token_ttl: parse_secs(&lookup, "REFRESH_TOKEN_TTL_SECS", REFRESH_TOKEN_TTL_SECS)?,
            federated,
            bootstrap_admins,
        })
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("'{raw}' is not a number of seconds"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn memory_backend_needs_no_database_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_ACCESS_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "r"),
            ("BOOTSTRAP_ADMINS", " Root@Example.com, ,ops@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.access_token_ttl, ACCESS_TOKEN_TTL_SECS);
        assert_eq!(config.bootstrap_admins, vec!["root@example.com", "ops@example.com"]);
        assert!(config.federated.is_none());
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = Config::from_lookup(lookup_from(&[
            ("JWT_ACCESS_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "r"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { name: "DATABASE_URL" }));
    }

    #[test]
    fn rejects_half_configured_federation() {
        let err = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_ACCESS_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "r"),
            ("FEDERATED_TOKEN_SECRET", "s"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}

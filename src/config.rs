use std::fmt;
use std::net::SocketAddr;

use crate::auth::token::MIN_SECRET_LEN;

/// One year.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: chrono::Duration,
    pub bind_addr: SocketAddr,
}

// Secret stays out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("bind_addr", &self.bind_addr)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://tasktrack.db".to_string());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
        if database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let ttl_minutes = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30i64)?;
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: format!("must be between 1 and {}", MAX_TTL_MINUTES),
            });
        }
        let access_token_ttl =
            chrono::Duration::try_minutes(ttl_minutes).ok_or_else(|| ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "out of range".into(),
            })?;

        let bind_addr = parse_or(
            &lookup,
            "BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            access_token_ttl,
            bind_addr,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.database_url, "sqlite://tasktrack.db");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn secret_is_required_and_long_enough() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { key: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "sqlite::memory:"),
        ])
        .unwrap();
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url, "sqlite::memory:");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(load(&[("JWT_SECRET", SECRET), ("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("ACCESS_TOKEN_EXPIRE_MINUTES", "soon")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let max = i64::MAX.to_string();
        assert!(matches!(
            load(&[("JWT_SECRET", SECRET), ("ACCESS_TOKEN_EXPIRE_MINUTES", max.as_str())]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", SECRET), ("ACCESS_TOKEN_EXPIRE_MINUTES", "1000000000000")]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));

        let one_year = MAX_TTL_MINUTES.to_string();
        let config = load(&[("JWT_SECRET", SECRET), ("ACCESS_TOKEN_EXPIRE_MINUTES", one_year.as_str())])
            .unwrap();
        assert_eq!(config.access_token_ttl, chrono::Duration::days(365));
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}

use std::{env, str::FromStr};

use derive_more::{Display, Error};

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "environment variable '{}' must be set", key)]
    Missing { key: String },

    #[display(fmt = "environment variable '{}' has invalid value '{}'", key, value)]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Settings {
    /// Reads the process environment; call `dotenv().ok()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing { key: key.to_string() })
        };

        let settings = Settings {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT", 8080)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl_secs: parsed(&lookup, "ACCESS_TOKEN_TTL_SECS", 60 * 60)?,
            page_size: parsed(&lookup, "PAGE_SIZE", 20)?,
            max_page_size: parsed(&lookup, "MAX_PAGE_SIZE", 100)?,
        };
        if settings.page_size == 0 || settings.max_page_size < settings.page_size {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE".to_string(),
                value: settings.page_size.to_string(),
            });
        }
        Ok(settings)
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
    }
}

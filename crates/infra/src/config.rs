//! Environment-sourced configuration. Grounded on the teacher's `main.rs`
//! (`DATABASE_URL`/`JWT_SECRET` read directly from the environment) and, for
//! the `dotenvy` + typed-struct shape, on the sibling example
//! `Fodi999-assistant::infrastructure::config::Config::from_env`.

use std::env;
use std::time::Duration;

use chrono::FixedOffset;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for environment variable {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Pool sizing per `spec.md` §5 ("min 1, max 10 typical").
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool: PoolConfig,
    /// The platform's single working-day timezone (`spec.md` §4.7:
    /// "Tenants operate on a single tz ... per-tenant tz is a future
    /// extension").
    pub platform_tz: FixedOffset,
}

impl Config {
    /// Reads `DATABASE_URL` (required), `DB_POOL_MIN_CONNECTIONS` /
    /// `DB_POOL_MAX_CONNECTIONS` (default 1/10), and
    /// `PLATFORM_TZ_OFFSET_MINUTES` (default 0, UTC) from the environment.
    /// Loads a `.env` file first, if present, exactly as the teacher's
    /// sibling repos do for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let min_connections = parse_env_or("DB_POOL_MIN_CONNECTIONS", 1)?;
        let max_connections = parse_env_or("DB_POOL_MAX_CONNECTIONS", 10)?;
        let tz_offset_minutes: i32 = parse_env_or("PLATFORM_TZ_OFFSET_MINUTES", 0)?;
        let platform_tz = FixedOffset::east_opt(tz_offset_minutes * 60).ok_or_else(|| ConfigError::Invalid {
            name: "PLATFORM_TZ_OFFSET_MINUTES",
            value: tz_offset_minutes.to_string(),
        })?;

        Ok(Self {
            database_url,
            pool: PoolConfig {
                min_connections,
                max_connections,
                acquire_timeout: Duration::from_secs(10),
            },
            platform_tz,
        })
    }
}

fn parse_env_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default; unset variables are logged and replaced by
//! it. A value that is set but does not parse is an error.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::service::ServiceSettings;

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Deployment mode. Development exposes error details in 500 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment {other}")),
        }
    }
}

/// The single accepted Basic-Auth credential pair.
#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password".to_string(),
        }
    }
}

/// Fixed-window rate limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub permits: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            permits: 100,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// SQLite path or `Data Source=<path>` connection string.
    pub database: String,
    pub auth: AuthConfig,
    pub environment: Environment,
    pub cache_ttl: Duration,
    pub stream_interval: Duration,
    pub rate_limit: RateLimitConfig,
    /// Insert sample orders into an empty store on startup.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database: "Data Source=orders.db".to_string(),
            auth: AuthConfig::default(),
            environment: Environment::default(),
            cache_ttl: Duration::from_secs(30),
            stream_interval: Duration::from_secs(5),
            rate_limit: RateLimitConfig::default(),
            seed: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let source = Source { lookup: &lookup };

        Ok(Self {
            addr: source.parse("ORDERS_ADDR", defaults.addr)?,
            database: source.string("ORDERS_DATABASE", defaults.database),
            auth: AuthConfig {
                username: source.string("ORDERS_AUTH_USERNAME", defaults.auth.username),
                password: source.secret("ORDERS_AUTH_PASSWORD", defaults.auth.password),
            },
            environment: source.parse("ORDERS_ENV", defaults.environment)?,
            cache_ttl: source.seconds("ORDERS_CACHE_TTL_SECS", defaults.cache_ttl)?,
            stream_interval: source.seconds("ORDERS_STREAM_INTERVAL_SECS", defaults.stream_interval)?,
            rate_limit: RateLimitConfig {
                permits: source.parse("ORDERS_RATE_LIMIT", defaults.rate_limit.permits)?,
                window: source.seconds("ORDERS_RATE_WINDOW_SECS", defaults.rate_limit.window)?,
            },
            seed: source.flag("ORDERS_SEED", defaults.seed)?,
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            cache_ttl: self.cache_ttl,
            feed_interval: self.stream_interval,
        }
    }
}

struct Source<'a, F> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Source<'_, F> {
    fn var(&self, key: &str) -> Option<String> {
        let value = (self.lookup)(key).filter(|v| !v.trim().is_empty());
        if value.is_none() {
            debug!("{key} not set, using default");
        }
        value
    }

    fn string(&self, key: &str, default: String) -> String {
        self.var(key).unwrap_or(default)
    }

    fn secret(&self, key: &str, default: String) -> String {
        self.var(key).unwrap_or_else(|| {
            warn!("{key} not set, using the built-in default credential");
            default
        })
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.var(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| {
                warn!("Invalid {key} value: {e}");
                ConfigError {
                    key,
                    reason: e.to_string(),
                    value,
                }
            }),
        }
    }

    fn seconds(&self, key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        self.parse(key, default.as_secs()).map(Duration::from_secs)
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.var(key) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError {
                key,
                reason: "expected a boolean".to_string(),
                value,
            }),
        }
    }
}

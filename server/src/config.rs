use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Built SPA to serve for non-API paths.
    pub static_dir: Option<PathBuf>,
    pub shield: ShieldConfig,
}

#[derive(Debug, Clone)]
pub struct ShieldConfig {
    pub enabled: bool,
    /// Bucket size per client.
    pub capacity: u32,
    /// Tokens added every `interval`.
    pub refill: u32,
    pub interval: Duration,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 20,
            refill: 30,
            interval: Duration::from_secs(5),
        }
    }
}

impl ShieldConfig {
    /// Capacity and interval must both be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_CAPACITY".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_INTERVAL_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: None,
            shield: ShieldConfig::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the environment. Unset variables fall
    /// back to defaults; set but unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let shield = ShieldConfig {
            enabled: try_load("SHIELD_ENABLED", defaults.shield.enabled)?,
            capacity: try_load("RATE_LIMIT_CAPACITY", defaults.shield.capacity)?,
            refill: try_load("RATE_LIMIT_REFILL", defaults.shield.refill)?,
            interval: Duration::from_secs(try_load(
                "RATE_LIMIT_INTERVAL_SECS",
                defaults.shield.interval.as_secs(),
            )?),
        };
        shield.validate()?;

        Ok(Self {
            host: try_load("HOST", defaults.host)?,
            port: try_load("PORT", defaults.port)?,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            shield,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_rate_limit() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.shield.capacity, 20);
        assert_eq!(config.shield.refill, 30);
        assert_eq!(config.shield.interval, Duration::from_secs(5));
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn unset_key_uses_default() {
        let port: u16 = try_load("CATALOG_TEST_SURELY_UNSET_PORT", 4000).unwrap();
        assert_eq!(port, 4000);
    }

    #[test]
    fn unparseable_value_is_an_error() {
        env::set_var("CATALOG_TEST_BAD_PORT", "abc");
        let err = try_load::<u16>("CATALOG_TEST_BAD_PORT", 3000).unwrap_err();
        env::remove_var("CATALOG_TEST_BAD_PORT");

        let ConfigError::Invalid { key, .. } = err;
        assert_eq!(key, "CATALOG_TEST_BAD_PORT");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let shield = ShieldConfig {
            capacity: 0,
            ..ShieldConfig::default()
        };
        let ConfigError::Invalid { key, .. } = shield.validate().unwrap_err();
        assert_eq!(key, "RATE_LIMIT_CAPACITY");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let shield = ShieldConfig {
            interval: Duration::ZERO,
            ..ShieldConfig::default()
        };
        assert!(shield.validate().is_err());
        assert!(ShieldConfig::default().validate().is_ok());
    }

    #[test]
    fn address_joins_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
    }
}

use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 10;

const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
const RESPONSE_TIMEOUT_VAR: &str = "RESPONSE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub log_level: String,
    pub response_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("RESPONSE_TIMEOUT_SECS must be a positive integer, got '{0}'")]
    InvalidResponseTimeout(String),
    #[error("LOG_LEVEL is not a valid filter directive: '{0}'")]
    InvalidLogLevel(String),
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(value) if !value.trim().is_empty() => {
                let value = value.trim().to_string();
                EnvFilter::try_new(&value)
                    .map_err(|_| ConfigError::InvalidLogLevel(value.clone()))?;
                value
            }
            _ => DEFAULT_LOG_LEVEL.to_string(),
        };

        let response_timeout = match lookup(RESPONSE_TIMEOUT_VAR) {
            Some(value) if !value.trim().is_empty() => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidResponseTimeout(value)),
            },
            _ => Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
        };

        Ok(Self {
            log_level,
            response_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = HandlerConfig::from_lookup(lookup(&[])).expect("config should load");
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("LOG_LEVEL", "warn,bucket_name_core=info"),
            ("RESPONSE_TIMEOUT_SECS", "30"),
        ]))
        .expect("config should load");

        assert_eq!(config.log_level, "warn,bucket_name_core=info");
        assert_eq!(config.response_timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_and_garbage_timeouts() {
        for value in ["0", "-5", "ten"] {
            let error = HandlerConfig::from_lookup(lookup(&[("RESPONSE_TIMEOUT_SECS", value)]))
                .expect_err("timeout should be rejected");
            assert_eq!(error, ConfigError::InvalidResponseTimeout(value.to_string()));
        }
    }

    #[test]
    fn rejects_unparseable_log_level() {
        let error = HandlerConfig::from_lookup(lookup(&[("LOG_LEVEL", "bucket_name_core=loud")]))
            .expect_err("log level should be rejected");
        assert!(matches!(error, ConfigError::InvalidLogLevel(_)));
    }
}

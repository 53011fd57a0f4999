use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BUFFER_SIZE: usize = 100;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const REFRESH_ENV: &str = "ORDER_ADMIN_REFRESH_MS";
pub const BUFFER_ENV: &str = "ORDER_ADMIN_BUFFER";
pub const LOG_ENV: &str = "RUST_LOG";

/// Startup settings for [`OrderSystem`](super::OrderSystem).
///
/// A refresh interval persisted by an earlier session takes precedence over
/// `refresh_interval`; a zero interval disables auto-refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub buffer_size: usize,
    pub refresh_interval: Duration,
    pub log_filter: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(REFRESH_ENV) {
            config.refresh_interval = Duration::from_millis(parse(REFRESH_ENV, &raw)?);
        }
        if let Some(raw) = lookup(BUFFER_ENV) {
            let size: usize = parse(BUFFER_ENV, &raw)?;
            if size == 0 {
                return Err(invalid(BUFFER_ENV, &raw));
            }
            config.buffer_size = size;
        }
        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = AdminConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AdminConfig::default());
        assert_eq!(config.refresh_interval, Duration::from_millis(30_000));
    }

    #[test]
    fn variables_override_defaults() {
        let config = AdminConfig::from_lookup(lookup(&[
            (REFRESH_ENV, "0"),
            (BUFFER_ENV, " 8 "),
            (LOG_ENV, "grocery_orders=debug"),
        ]))
        .unwrap();
        assert!(config.refresh_interval.is_zero());
        assert_eq!(config.buffer_size, 8);
        assert_eq!(config.log_filter, "grocery_orders=debug");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = AdminConfig::from_lookup(lookup(&[(REFRESH_ENV, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: REFRESH_ENV.to_string(),
                value: "soon".to_string()
            }
        );
        assert!(AdminConfig::from_lookup(lookup(&[(BUFFER_ENV, "0")])).is_err());
    }
}

//! Application-level configuration

use serde::{Deserialize, Serialize};

/// Default log filter when neither `RUST_LOG` nor `DASH_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "warn,dash_stock=info";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Fallback `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-dash".to_string(),
            environment: "development".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Build a config from `DASH_ENV` and `DASH_LOG`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            app_name: defaults.app_name,
            environment: lookup("DASH_ENV")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.environment),
            log_filter: lookup("DASH_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }

    /// Override the fallback log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app_name, "stock-dash");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("DASH_ENV", "production"), ("DASH_LOG", "debug")]);
        let config = Config::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.environment, "production");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = Config::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_with_log_filter() {
        let config = Config::default().with_log_filter("trace");
        assert_eq!(config.log_filter, "trace");
    }

    #[test]
    fn test_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

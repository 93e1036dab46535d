//! Configuration Module
//!
//! Cache tunables, their environment overrides, and the modifier hook applied
//! before a cache is built.

use std::env;

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Number of pending access signals the repositioner will queue before
/// further signals are dropped.
pub const DEFAULT_ACCESS_BUFFER: usize = 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of entries kept once the pipeline quiesces
    pub capacity: usize,
    /// Bound of the access channel feeding the repositioner
    pub access_buffer: usize,
}

/// Configuration hook applied at construction time.
pub type Modifier = Box<dyn FnOnce(&mut Config) + Send>;

/// Overrides the cache capacity.
pub fn with_capacity(capacity: usize) -> Modifier {
    Box::new(move |config: &mut Config| config.capacity = capacity)
}

/// Overrides the access channel bound.
pub fn with_access_buffer(access_buffer: usize) -> Modifier {
    Box::new(move |config: &mut Config| config.access_buffer = access_buffer)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRU_CAPACITY` - Maximum cache entries (default: 10)
    /// - `LRU_ACCESS_BUFFER` - Pending access signals (default: 1024)
    pub fn from_env() -> Self {
        Self {
            capacity: env::var("LRU_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
            access_buffer: env::var("LRU_ACCESS_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_BUFFER),
        }
    }

    /// Applies modifiers in order and returns the resulting config.
    pub fn apply<I>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = Modifier>,
    {
        for modifier in modifiers {
            modifier(&mut self);
        }
        self
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        if self.access_buffer == 0 {
            return Err(CacheError::InvalidConfig(
                "access buffer must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            access_buffer: DEFAULT_ACCESS_BUFFER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.access_buffer, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("LRU_CAPACITY");
        env::remove_var("LRU_ACCESS_BUFFER");

        let config = Config::from_env();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_modifiers_apply_in_order() {
        let config =
            Config::default().apply(vec![with_capacity(3), with_access_buffer(8), with_capacity(5)]);

        assert_eq!(config.capacity, 5);
        assert_eq!(config.access_buffer, 8);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config::default().apply(vec![with_capacity(0)]);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_access_buffer() {
        let config = Config::default().apply(vec![with_access_buffer(0)]);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = serde_json::from_str(r#"{"capacity": 3}"#).unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.access_buffer, DEFAULT_ACCESS_BUFFER);
    }
}

//! Mapper configuration.

use std::env;

/// Limits and defaults applied by the operation compiler.
///
/// The batch limits mirror the store's documented request limits. They are
/// configurable so a deployment can track a store whose limits differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Maximum keys in one batch get (default 100).
    pub max_batch_get_items: usize,
    /// Maximum requests in one batch write (default 25).
    pub max_batch_write_items: usize,
    /// Maximum members in one write transaction (default 100).
    pub max_transact_items: usize,
    /// Consistent-read flag applied when an intent leaves it unset.
    pub default_consistent_read: bool,
}

impl MapperConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_batch_get_items: env_usize(
                "DYNAMODEL_MAX_BATCH_GET_ITEMS",
                defaults.max_batch_get_items,
            ),
            max_batch_write_items: env_usize(
                "DYNAMODEL_MAX_BATCH_WRITE_ITEMS",
                defaults.max_batch_write_items,
            ),
            max_transact_items: env_usize(
                "DYNAMODEL_MAX_TRANSACT_ITEMS",
                defaults.max_transact_items,
            ),
            default_consistent_read: env_bool(
                "DYNAMODEL_CONSISTENT_READ",
                defaults.default_consistent_read,
            ),
        }
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_batch_get_items: 100,
            max_batch_write_items: 25,
            max_transact_items: 100,
            default_consistent_read: false,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.max_batch_get_items, 100);
        assert_eq!(config.max_batch_write_items, 25);
        assert_eq!(config.max_transact_items, 100);
        assert!(!config.default_consistent_read);
    }

    #[test]
    fn test_should_fall_back_on_unset_variable() {
        assert_eq!(env_usize("DYNAMODEL_TEST_UNSET_VARIABLE", 7), 7);
        assert!(env_bool("DYNAMODEL_TEST_UNSET_VARIABLE", true));
    }
}

//! Immutable populator settings

use moredis_core::{ConfigError, DEFAULT_FLUSH_INTERVAL, DEFAULT_KEY_PREFIX};

/// Settings fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateSettings {
    /// Prefix for the shared counter and allocated hash keys.
    pub key_prefix: String,
    /// Queued writes that trigger an automatic flush.
    pub flush_interval: usize,
}

impl Default for PopulateSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl PopulateSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "key_prefix".to_string(),
            });
        }
        if self.key_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "key_prefix".to_string(),
                reason: "must not contain whitespace".to_string(),
            });
        }
        if self.flush_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "flush_interval".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

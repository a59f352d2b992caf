//! Run settings

use crate::args::Args;
use moredis_core::{ConfigError, RunParameters};
use moredis_populator::PopulateSettings;
use std::path::PathBuf;

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub cache: String,
    pub params: RunParameters,
    pub config_path: PathBuf,
    pub redis_url: String,
    pub mongo_url: String,
    pub mongo_db: Option<String>,
    pub populate: PopulateSettings,
}

impl RunSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("cache", &self.cache),
            ("redis_url", &self.redis_url),
            ("mongo_url", &self.mongo_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }
        self.populate.validate()
    }
}

impl TryFrom<Args> for RunSettings {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let settings = Self {
            cache: args.cache,
            params: args.params,
            config_path: args.conf_file,
            redis_url: args.redis_url,
            mongo_url: args.mongo_url,
            mongo_db: args.mongo_db,
            populate: PopulateSettings {
                key_prefix: args.key_prefix,
                flush_interval: args.flush_interval,
            },
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_args() {
        let args = Args::try_parse_from([
            "moredis",
            "-c",
            "users",
            "-r",
            "redis:6379",
            "-m",
            "mongo:27017/app",
        ])
        .unwrap();
        let settings = RunSettings::try_from(args).unwrap();
        assert_eq!(settings.cache, "users");
        assert_eq!(settings.redis_url, "redis:6379");
        assert_eq!(settings.populate, PopulateSettings::default());
    }

    #[test]
    fn test_rejects_zero_flush_interval() {
        let args = Args::try_parse_from([
            "moredis",
            "-c",
            "users",
            "--flush-interval",
            "0",
        ])
        .unwrap();
        let err = RunSettings::try_from(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "flush_interval"));
    }

    #[test]
    fn test_rejects_blank_cache() {
        let args = Args::try_parse_from(["moredis", "-c", " "]).unwrap();
        let err = RunSettings::try_from(args).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired {
                field: "cache".to_string()
            }
        );
    }
}

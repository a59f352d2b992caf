//! CLI errors

use moredis_core::ConfigError;
use moredis_populator::PopulateError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Populate(#[from] PopulateError),

    #[error("Failed to initialize logging: {reason}")]
    Telemetry { reason: String },
}

pub type CliResult<T> = Result<T, CliError>;

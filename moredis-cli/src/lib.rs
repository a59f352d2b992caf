//! moredis CLI
//!
//! Argument parsing, settings resolution, logging setup, and the top-level
//! run used by the `moredis` binary.

pub mod args;
pub mod error;
pub mod settings;
pub mod telemetry;

pub use args::Args;
pub use error::{CliError, CliResult};
pub use settings::RunSettings;

use moredis_core::{CacheDefinition, MoredisConfig};
use moredis_populator::{build_cache, PopulateReport};
use tracing::info;

/// Load the configuration and return the requested cache, validated.
pub fn load_cache(settings: &RunSettings) -> CliResult<CacheDefinition> {
    let config = MoredisConfig::from_path(&settings.config_path)?;
    let cache = config.cache(&settings.cache)?;
    cache.validate()?;
    info!(
        config = %settings.config_path.display(),
        cache = %cache.name,
        collections = cache.collections.len(),
        "Loaded cache configuration"
    );
    Ok(cache.clone())
}

/// Build the configured cache against the configured backends.
pub fn run(settings: &RunSettings) -> CliResult<PopulateReport> {
    let cache = load_cache(settings)?;
    let report = build_cache(
        &settings.populate,
        &settings.redis_url,
        &settings.mongo_url,
        settings.mongo_db.as_deref(),
        &cache,
        &settings.params,
    )?;
    Ok(report)
}

//! Running against real Redis and MongoDB

use crate::error::{PopulateError, Stage};
use crate::populator::{CachePopulator, PopulateReport};
use crate::settings::PopulateSettings;
use moredis_core::{CacheDefinition, RunParameters};
use moredis_storage::{MongoSource, RedisStore};
use tracing::{error, info};

/// Connect to both backends and populate `cache`.
///
/// Connections are opened once and released when this returns, on success
/// or failure.
pub fn build_cache(
    settings: &PopulateSettings,
    redis_url: &str,
    mongo_url: &str,
    mongo_db: Option<&str>,
    cache: &CacheDefinition,
    params: &RunParameters,
) -> Result<PopulateReport, PopulateError> {
    let connect_error = |e: PopulateError| {
        error!(error = %e, "Connection failed");
        e
    };

    let store = RedisStore::connect(redis_url)
        .map_err(|e| connect_error(PopulateError::new(&cache.name, Stage::Connect, e)))?;
    let source = MongoSource::connect(mongo_url, mongo_db)
        .map_err(|e| connect_error(PopulateError::new(&cache.name, Stage::Connect, e)))?;
    info!(cache = %cache.name, "Connections established");

    CachePopulator::new(store, source, settings.clone()).populate(cache, params)
}

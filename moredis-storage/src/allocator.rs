//! Hash key allocation

use crate::traits::HashStore;
use moredis_core::{StoreError, StoreResult};
use tracing::debug;

/// `<prefix>:mapindexcounter`
pub fn counter_key(prefix: &str) -> String {
    format!("{}:mapindexcounter", prefix)
}

/// `<prefix>:maps:<index>`
pub fn hash_key(prefix: &str, index: i64) -> String {
    format!("{}:maps:{}", prefix, index)
}

/// Reserve a fresh hash key with one atomic increment of the shared counter.
///
/// Concurrent runs against the same store never receive the same key.
pub fn allocate_hash_key<S: HashStore>(store: &mut S, prefix: &str) -> StoreResult<String> {
    let counter = counter_key(prefix);
    let index = store
        .incr(&counter)
        .map_err(|e| StoreError::Allocation {
            counter: counter.clone(),
            reason: e.to_string(),
        })?;
    let key = hash_key(prefix, index);
    debug!(counter = %counter, key = %key, "Allocated hash key");
    Ok(key)
}

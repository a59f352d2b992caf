//! Reference swapping
//!
//! A pointer key names the hash that readers should use. Swapping replaces
//! the pointer with one atomic GETSET, then deletes whatever it used to
//! reference. Readers therefore see either the complete old hash or the
//! complete new one.

use crate::traits::HashStore;
use moredis_core::{StoreError, StoreResult};
use tracing::info;

/// Point `pointer` at `new_key` and delete the hash it previously named.
///
/// Returns the previous hash key, if any.
pub fn swap_reference<S: HashStore>(
    store: &mut S,
    pointer: &str,
    new_key: &str,
) -> StoreResult<Option<String>> {
    let old_key = store.get_set(pointer, new_key)?;

    info!(
        pointer = %pointer,
        old_ref = old_key.as_deref().unwrap_or(""),
        new_ref = %new_key,
        "Updated map reference"
    );

    if let Some(old) = &old_key {
        store.del(old).map_err(|e| StoreError::SwapCleanup {
            pointer: pointer.to_string(),
            old_key: old.clone(),
            new_key: new_key.to_string(),
            reason: e.to_string(),
        })?;
        info!(map = %old, "Deleted old map");
    }

    Ok(old_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, StoreOp};

    #[test]
    fn test_swap_without_previous_value() {
        let mut store = MemoryStore::new();
        let old = swap_reference(&mut store, "users", "moredis:maps:1").unwrap();
        assert_eq!(old, None);
        assert_eq!(store.get("users"), Some("moredis:maps:1"));
        assert!(store.deleted().is_empty());
    }

    #[test]
    fn test_swap_deletes_previous_hash() {
        let mut store = MemoryStore::new().with_value("users", "moredis:maps:1");
        let old = swap_reference(&mut store, "users", "moredis:maps:2").unwrap();
        assert_eq!(old.as_deref(), Some("moredis:maps:1"));
        assert_eq!(store.get("users"), Some("moredis:maps:2"));
        assert_eq!(store.deleted(), ["moredis:maps:1".to_string()]);
    }

    #[test]
    fn test_delete_failure_keeps_new_reference() {
        let mut store = MemoryStore::new()
            .with_value("users", "moredis:maps:1")
            .fail_on(StoreOp::Del);
        let err = swap_reference(&mut store, "users", "moredis:maps:2").unwrap_err();
        assert!(matches!(err, StoreError::SwapCleanup { ref old_key, .. } if old_key == "moredis:maps:1"));
        assert_eq!(store.get("users"), Some("moredis:maps:2"));
    }

    #[test]
    fn test_get_set_failure_is_write_error() {
        let mut store = MemoryStore::new().fail_on(StoreOp::GetSet);
        let err = swap_reference(&mut store, "users", "moredis:maps:2").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.get("users"), None);
    }
}

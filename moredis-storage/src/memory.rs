//! In-memory store and source for tests
//!
//! Both fakes record what they were asked to do so tests can assert on the
//! exact command sequence, and both can be told to fail a specific
//! operation.

use crate::traits::{Command, DocumentSource, HashStore, RecordCursor};
use bson::{Bson, Document};
use moredis_core::{SourceError, SourceResult, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// STORE
// ============================================================================

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Send,
    Flush,
    Ping,
    Incr,
    GetSet,
    Del,
}

/// In-memory [`HashStore`]. Queued commands only take effect on `flush`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    commands: Vec<Command>,
    queued: Vec<Command>,
    flushes: usize,
    pings: usize,
    counters: HashMap<String, i64>,
    values: HashMap<String, String>,
    hashes: HashMap<String, BTreeMap<String, String>>,
    deleted: Vec<String>,
    failing: HashSet<StoreOp>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a string value, e.g. an existing pointer.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_counter(mut self, key: impl Into<String>, value: i64) -> Self {
        self.counters.insert(key.into(), value);
        self
    }

    pub fn fail_on(mut self, op: StoreOp) -> Self {
        self.failing.insert(op);
        self
    }

    /// Every command passed to `send`, in order, flushed or not.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn ping_count(&self) -> usize {
        self.pings
    }

    pub fn counter(&self, key: &str) -> Option<i64> {
        self.counters.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn hash(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        self.hashes.get(key)
    }

    pub fn hash_field(&self, key: &str, field: &str) -> Option<&str> {
        self.hashes.get(key)?.get(field).map(String::as_str)
    }

    /// Keys removed with `del`, in order.
    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    fn check(&self, op: StoreOp, command: &str) -> StoreResult<()> {
        if self.failing.contains(&op) {
            return Err(StoreError::Write {
                command: command.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, command: &Command) -> StoreResult<()> {
        match (command.name.as_str(), command.args.as_slice()) {
            ("HSET", [hash, field, value]) => {
                self.hashes
                    .entry(hash.clone())
                    .or_default()
                    .insert(field.clone(), value.clone());
                Ok(())
            }
            _ => Err(StoreError::Write {
                command: command.to_string(),
                reason: "unsupported command".to_string(),
            }),
        }
    }
}

impl HashStore for MemoryStore {
    fn send(&mut self, command: Command) -> StoreResult<()> {
        self.check(StoreOp::Send, &command.to_string())?;
        self.commands.push(command.clone());
        self.queued.push(command);
        Ok(())
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.check(StoreOp::Flush, "pipeline")?;
        for command in std::mem::take(&mut self.queued) {
            self.apply(&command)?;
        }
        self.flushes += 1;
        Ok(())
    }

    fn ping(&mut self) -> StoreResult<()> {
        self.check(StoreOp::Ping, "PING")?;
        self.pings += 1;
        Ok(())
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        self.check(StoreOp::Incr, &format!("INCR {}", key))?;
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn get_set(&mut self, key: &str, value: &str) -> StoreResult<Option<String>> {
        self.check(StoreOp::GetSet, &format!("GETSET {} {}", key, value))?;
        Ok(self.values.insert(key.to_string(), value.to_string()))
    }

    fn del(&mut self, key: &str) -> StoreResult<()> {
        self.check(StoreOp::Del, &format!("DEL {}", key))?;
        self.values.remove(key);
        self.hashes.remove(key);
        self.deleted.push(key.to_string());
        Ok(())
    }
}

// ============================================================================
// SOURCE
// ============================================================================

/// A `find` call as seen by [`MemorySource`].
#[derive(Debug, Clone, PartialEq)]
pub struct FindCall {
    pub collection: String,
    pub filter: Document,
    pub projection: Option<Document>,
}

/// In-memory [`DocumentSource`].
///
/// Filters match on top-level equality for plain values; operator keys
/// (`$...`) and nested-document conditions are ignored. Projections are
/// recorded but not applied.
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<Document>>,
    calls: RefCell<Vec<FindCall>>,
    fail_find: HashSet<String>,
    fail_after: HashMap<String, usize>,
    fail_close: HashSet<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.collections.insert(name.into(), documents);
        self
    }

    /// Make `find` against `collection` fail.
    pub fn fail_find(mut self, collection: impl Into<String>) -> Self {
        self.fail_find.insert(collection.into());
        self
    }

    /// Make the cursor over `collection` fail after yielding `count` records.
    pub fn fail_after(mut self, collection: impl Into<String>, count: usize) -> Self {
        self.fail_after.insert(collection.into(), count);
        self
    }

    pub fn fail_close(mut self, collection: impl Into<String>) -> Self {
        self.fail_close.insert(collection.into());
        self
    }

    pub fn calls(&self) -> Vec<FindCall> {
        self.calls.borrow().clone()
    }
}

impl DocumentSource for MemorySource {
    type Cursor = MemoryCursor;

    fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> SourceResult<MemoryCursor> {
        self.calls.borrow_mut().push(FindCall {
            collection: collection.to_string(),
            filter: filter.clone(),
            projection,
        });

        if self.fail_find.contains(collection) {
            return Err(SourceError::Query {
                collection: collection.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let records: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches_filter(d, &filter)).cloned().collect())
            .unwrap_or_default();

        Ok(MemoryCursor {
            collection: collection.to_string(),
            records: records.into_iter(),
            yielded: 0,
            fail_after: self.fail_after.get(collection).copied(),
            fail_close: self.fail_close.contains(collection),
        })
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        if key.starts_with('$') || matches!(expected, Bson::Document(_)) {
            return true;
        }
        document.get(key) == Some(expected)
    })
}

/// Cursor returned by [`MemorySource`].
#[derive(Debug)]
pub struct MemoryCursor {
    collection: String,
    records: std::vec::IntoIter<Document>,
    yielded: usize,
    fail_after: Option<usize>,
    fail_close: bool,
}

impl RecordCursor for MemoryCursor {
    fn next_record(&mut self) -> SourceResult<Option<Document>> {
        if self.fail_after == Some(self.yielded) {
            return Err(SourceError::Iteration {
                collection: self.collection.clone(),
                reason: "injected failure".to_string(),
            });
        }
        let next = self.records.next();
        if next.is_some() {
            self.yielded += 1;
        }
        Ok(next)
    }

    fn close(self) -> SourceResult<()> {
        if self.fail_close {
            return Err(SourceError::Iteration {
                collection: self.collection,
                reason: "injected close failure".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_queued_commands_apply_on_flush() {
        let mut store = MemoryStore::new();
        store.send(Command::hset("h", "1", "expected")).unwrap();
        assert_eq!(store.hash("h"), None);
        store.flush().unwrap();
        assert_eq!(store.hash_field("h", "1"), Some("expected"));
        assert_eq!(store.commands().len(), 1);
    }

    #[test]
    fn test_unsupported_command_fails_flush() {
        let mut store = MemoryStore::new();
        store.send(Command::new("LPUSH", vec!["l".into(), "x".into()])).unwrap();
        assert!(store.flush().is_err());
    }

    #[test]
    fn test_del_removes_hash() {
        let mut store = MemoryStore::new();
        store.send(Command::hset("h", "a", "1")).unwrap();
        store.flush().unwrap();
        store.del("h").unwrap();
        assert_eq!(store.hash("h"), None);
        assert_eq!(store.deleted(), ["h".to_string()]);
    }

    #[test]
    fn test_source_filters_and_records_calls() {
        let source = MemorySource::new().with_collection(
            "users",
            vec![doc! { "id": 1, "org": "a" }, doc! { "id": 2, "org": "b" }],
        );

        let mut cursor = source
            .find("users", doc! { "org": "b", "age": { "$gt": 3 } }, None)
            .unwrap();
        assert_eq!(cursor.next_record().unwrap(), Some(doc! { "id": 2, "org": "b" }));
        assert_eq!(cursor.next_record().unwrap(), None);
        cursor.close().unwrap();

        let calls = source.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].collection, "users");
    }

    #[test]
    fn test_unknown_collection_is_empty() {
        let source = MemorySource::new();
        let mut cursor = source.find("nothing", doc! {}, None).unwrap();
        assert_eq!(cursor.next_record().unwrap(), None);
    }

    #[test]
    fn test_injected_source_failures() {
        let source = MemorySource::new()
            .with_collection("users", vec![doc! { "id": 1 }, doc! { "id": 2 }])
            .fail_after("users", 1)
            .fail_find("orgs");

        assert!(matches!(
            source.find("orgs", doc! {}, None),
            Err(SourceError::Query { .. })
        ));

        let mut cursor = source.find("users", doc! {}, None).unwrap();
        assert!(cursor.next_record().unwrap().is_some());
        assert!(matches!(
            cursor.next_record(),
            Err(SourceError::Iteration { .. })
        ));
    }
}

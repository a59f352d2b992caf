//! Store and source capabilities
//!
//! The populator only ever talks to these traits. Production code plugs in
//! [`RedisStore`](crate::RedisStore) and [`MongoSource`](crate::MongoSource);
//! tests plug in the in-memory fakes.

use bson::Document;
use moredis_core::{SourceResult, StoreResult};
use std::fmt;

/// One pipelined store command, e.g. `HSET <hash> <field> <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn hset(hash: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new("HSET", vec![hash.into(), field.into(), value.into()])
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A key-value store with hashes, counters, and pipelining.
///
/// `send` only queues; nothing is guaranteed to reach the store until
/// `flush` returns. The remaining operations are synchronous round trips.
pub trait HashStore {
    /// Queue a command in the pipeline.
    fn send(&mut self, command: Command) -> StoreResult<()>;

    /// Transmit every queued command.
    fn flush(&mut self) -> StoreResult<()>;

    /// One synchronous round trip.
    fn ping(&mut self) -> StoreResult<()>;

    /// Atomically increment a counter, returning the new value.
    fn incr(&mut self, key: &str) -> StoreResult<i64>;

    /// Atomically set `key` to `value`, returning the previous value.
    fn get_set(&mut self, key: &str, value: &str) -> StoreResult<Option<String>>;

    fn del(&mut self, key: &str) -> StoreResult<()>;
}

/// A forward-only cursor over query results.
pub trait RecordCursor {
    /// Next record, or `None` once the cursor is exhausted.
    fn next_record(&mut self) -> SourceResult<Option<Document>>;

    /// Release the cursor, surfacing any deferred error.
    fn close(self) -> SourceResult<()>;
}

/// A collection-oriented document database.
pub trait DocumentSource {
    type Cursor: RecordCursor;

    fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> SourceResult<Self::Cursor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let cmd = Command::hset("h", "1", "expected");
        assert_eq!(cmd.to_string(), "HSET h 1 expected");
        assert_eq!(Command::new("PING", vec![]).to_string(), "PING");
    }
}

//! Batched writes

use crate::traits::{Command, HashStore};
use moredis_core::{StoreResult, DEFAULT_FLUSH_INTERVAL};
use tracing::debug;

/// Queues commands on a store and flushes every `flush_interval` sends.
///
/// A flush transmits the pipeline and then pings, so when `flush` returns
/// every queued write has been acknowledged.
#[derive(Debug)]
pub struct BatchWriter<S> {
    store: S,
    flush_interval: usize,
    pending: usize,
}

impl<S: HashStore> BatchWriter<S> {
    /// An interval of zero is treated as one.
    pub fn new(store: S, flush_interval: usize) -> Self {
        Self {
            store,
            flush_interval: flush_interval.max(1),
            pending: 0,
        }
    }

    pub fn with_default_interval(store: S) -> Self {
        Self::new(store, DEFAULT_FLUSH_INTERVAL)
    }

    pub fn send(&mut self, command: Command) -> StoreResult<()> {
        self.store.send(command)?;
        self.pending += 1;
        if self.pending >= self.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    /// No-op when nothing is pending.
    pub fn flush(&mut self) -> StoreResult<()> {
        if self.pending == 0 {
            return Ok(());
        }
        debug!(pending = self.pending, "Flushing pipelined writes");
        self.store.flush()?;
        self.store.ping()?;
        self.pending = 0;
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn flush_interval(&self) -> usize {
        self.flush_interval
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for round-trip operations that bypass the pipeline.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

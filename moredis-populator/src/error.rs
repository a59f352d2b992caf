//! Population failures

use moredis_core::MoredisError;
use std::fmt;
use thiserror::Error;

/// Where in a population run a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Opening the store or source. Happens once per run, before any collection.
    Connect,
    AllocateKeys,
    CompileTemplates,
    BuildQuery,
    IterateAndWrite,
    FlushWriter,
    SwapReferences,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Connect => "connect",
            Stage::AllocateKeys => "allocate keys",
            Stage::CompileTemplates => "compile templates",
            Stage::BuildQuery => "build query",
            Stage::IterateAndWrite => "iterate and write",
            Stage::FlushWriter => "flush writer",
            Stage::SwapReferences => "swap references",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first failure of a run, with enough context to find the offending
/// configuration entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "Populating cache {cache}{} failed at {stage}{}: {source}",
    collection_suffix(.collection),
    map_suffix(.map)
)]
pub struct PopulateError {
    pub cache: String,
    /// `None` only for [`Stage::Connect`].
    pub collection: Option<String>,
    pub stage: Stage,
    /// Pointer-name template of the map involved, where one applies.
    pub map: Option<String>,
    pub source: MoredisError,
}

impl PopulateError {
    pub fn new(cache: &str, stage: Stage, source: impl Into<MoredisError>) -> Self {
        Self {
            cache: cache.to_string(),
            collection: None,
            stage,
            map: None,
            source: source.into(),
        }
    }

    pub fn in_collection(mut self, collection: &str) -> Self {
        self.collection = Some(collection.to_string());
        self
    }

    pub fn for_map(mut self, map: &str) -> Self {
        self.map = Some(map.to_string());
        self
    }
}

fn collection_suffix(collection: &Option<String>) -> String {
    collection
        .as_ref()
        .map(|c| format!(" (collection {})", c))
        .unwrap_or_default()
}

fn map_suffix(map: &Option<String>) -> String {
    map.as_ref()
        .map(|m| format!(" for map {}", m))
        .unwrap_or_default()
}

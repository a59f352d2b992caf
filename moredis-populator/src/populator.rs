//! Cache population
//!
//! Each collection of a cache moves through the same sequence of stages:
//!
//! ```text
//! AllocateKeys -> CompileTemplates -> BuildQuery -> IterateAndWrite
//!     -> FlushWriter -> SwapReferences -> Done
//! ```
//!
//! Collections are processed one after another. The first failure stops the
//! run; collections that were already swapped keep their new maps, and
//! hashes written for the failing collection are left unreferenced.

use crate::error::{PopulateError, Stage};
use crate::settings::PopulateSettings;
use bson::Document;
use moredis_core::{
    CacheDefinition, CollectionSpec, MapSpec, MoredisError, MoredisResult, RunParameters,
};
use moredis_storage::{
    allocate_hash_key, swap_reference, BatchWriter, Command, DocumentSource, HashStore,
    RecordCursor,
};
use moredis_template::{build_query, is_skip_marker, Template};
use tracing::{debug, error, info};

/// A map with its freshly allocated hash key and compiled templates.
#[derive(Debug, Clone)]
pub struct AllocatedMap<'c> {
    pub spec: &'c MapSpec,
    pub hash_key: String,
    pub name_template: Template,
    pub key_template: Template,
    pub value_template: Template,
}

impl<'c> AllocatedMap<'c> {
    fn compile(spec: &'c MapSpec, hash_key: String) -> MoredisResult<Self> {
        Ok(Self {
            spec,
            hash_key,
            name_template: Template::compile(&spec.name)?,
            key_template: Template::compile(&spec.key)?,
            value_template: Template::compile(&spec.value)?,
        })
    }
}

/// A completed pointer swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwappedMap {
    pub pointer: String,
    pub hash_key: String,
    pub previous: Option<String>,
}

/// Counts for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionReport {
    pub collection: String,
    pub documents: usize,
    pub writes: usize,
    /// Record/map pairs skipped because the rendered key was empty or missing.
    pub skipped: usize,
    pub maps: Vec<SwappedMap>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulateReport {
    pub cache: String,
    pub collections: Vec<CollectionReport>,
}

impl PopulateReport {
    pub fn documents(&self) -> usize {
        self.collections.iter().map(|c| c.documents).sum()
    }

    pub fn writes(&self) -> usize {
        self.collections.iter().map(|c| c.writes).sum()
    }
}

/// Populates caches from a document source into a hash store.
#[derive(Debug)]
pub struct CachePopulator<S, D> {
    writer: BatchWriter<S>,
    source: D,
    settings: PopulateSettings,
}

impl<S: HashStore, D: DocumentSource> CachePopulator<S, D> {
    pub fn new(store: S, source: D, settings: PopulateSettings) -> Self {
        Self {
            writer: BatchWriter::new(store, settings.flush_interval),
            source,
            settings,
        }
    }

    pub fn settings(&self) -> &PopulateSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        self.writer.store()
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn into_parts(self) -> (S, D) {
        (self.writer.into_inner(), self.source)
    }

    /// Populate every collection of `cache`, stopping at the first failure.
    pub fn populate(
        &mut self,
        cache: &CacheDefinition,
        params: &RunParameters,
    ) -> Result<PopulateReport, PopulateError> {
        info!(cache = %cache.name, params = %params, "Populating cache");

        let context = params.to_document();
        let mut report = PopulateReport {
            cache: cache.name.clone(),
            collections: Vec::with_capacity(cache.collections.len()),
        };

        for spec in &cache.collections {
            let collection = self
                .populate_collection(spec, params, &context)
                .map_err(|e| e.into_populate_error(&cache.name, &spec.collection))
                .inspect_err(|e| error!(error = %e, "Cache population failed"))?;
            report.collections.push(collection);
        }

        info!(
            cache = %cache.name,
            documents = report.documents(),
            writes = report.writes(),
            "Completed populating cache"
        );
        Ok(report)
    }

    fn populate_collection(
        &mut self,
        spec: &CollectionSpec,
        params: &RunParameters,
        context: &Document,
    ) -> Result<CollectionReport, StageError> {
        let mut report = CollectionReport {
            collection: spec.collection.clone(),
            ..Default::default()
        };

        // AllocateKeys
        let mut hash_keys = Vec::with_capacity(spec.maps.len());
        for map in &spec.maps {
            let key = allocate_hash_key(self.writer.store_mut(), &self.settings.key_prefix)
                .map_err(|e| StageError::for_map(Stage::AllocateKeys, map, e))?;
            hash_keys.push(key);
        }

        // CompileTemplates
        let maps = spec
            .maps
            .iter()
            .zip(hash_keys)
            .map(|(map, key)| {
                AllocatedMap::compile(map, key)
                    .map_err(|e| StageError::for_map(Stage::CompileTemplates, map, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // BuildQuery
        let query = build_query(spec, params).map_err(|e| StageError::new(Stage::BuildQuery, e))?;
        info!(
            collection = %spec.collection,
            filter = %query.filter,
            projection = ?query.projection,
            "Querying collection"
        );

        // IterateAndWrite
        let mut cursor = self
            .source
            .find(&spec.collection, query.filter, query.projection)
            .map_err(|e| StageError::new(Stage::IterateAndWrite, e))?;

        while let Some(record) = cursor
            .next_record()
            .map_err(|e| StageError::new(Stage::IterateAndWrite, e))?
        {
            report.documents += 1;
            for map in &maps {
                if self.write_record(map, &record)? {
                    report.writes += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }
        cursor
            .close()
            .map_err(|e| StageError::new(Stage::IterateAndWrite, e))?;
        info!(
            collection = %spec.collection,
            documents = report.documents,
            writes = report.writes,
            skipped = report.skipped,
            "Processed documents"
        );

        // FlushWriter
        self.writer
            .flush()
            .map_err(|e| StageError::new(Stage::FlushWriter, e))?;

        // SwapReferences
        for map in &maps {
            let swapped = self
                .swap_map(map, context)
                .map_err(|e| StageError::for_map(Stage::SwapReferences, map.spec, e))?;
            report.maps.push(swapped);
        }

        Ok(report)
    }

    /// Write one record into one map. Returns `false` when the rendered key
    /// says the record has nothing for this map.
    fn write_record(&mut self, map: &AllocatedMap<'_>, record: &Document) -> Result<bool, StageError> {
        let stage_error = |e: MoredisError| StageError::for_map(Stage::IterateAndWrite, map.spec, e);

        let key = map
            .key_template
            .execute(record)
            .map_err(|e| stage_error(e.into()))?;
        if is_skip_marker(&key) {
            debug!(map = %map.spec.name, "Skipping record with empty key");
            return Ok(false);
        }

        let value = map
            .value_template
            .execute(record)
            .map_err(|e| stage_error(e.into()))?;
        self.writer
            .send(Command::hset(map.hash_key.as_str(), key, value))
            .map_err(|e| stage_error(e.into()))?;
        Ok(true)
    }

    fn swap_map(&mut self, map: &AllocatedMap<'_>, context: &Document) -> MoredisResult<SwappedMap> {
        let pointer = map.name_template.execute(context)?;
        let previous = swap_reference(self.writer.store_mut(), &pointer, &map.hash_key)?;
        Ok(SwappedMap {
            pointer,
            hash_key: map.hash_key.clone(),
            previous,
        })
    }
}

/// A failure inside one collection, before the cache and collection names
/// are attached.
#[derive(Debug)]
struct StageError {
    stage: Stage,
    map: Option<String>,
    source: MoredisError,
}

impl StageError {
    fn new(stage: Stage, source: impl Into<MoredisError>) -> Self {
        Self {
            stage,
            map: None,
            source: source.into(),
        }
    }

    fn for_map(stage: Stage, map: &MapSpec, source: impl Into<MoredisError>) -> Self {
        Self {
            stage,
            map: Some(map.name.clone()),
            source: source.into(),
        }
    }

    fn into_populate_error(self, cache: &str, collection: &str) -> PopulateError {
        let err = PopulateError::new(cache, self.stage, self.source).in_collection(collection);
        match self.map {
            Some(map) => err.for_map(&map),
            None => err,
        }
    }
}

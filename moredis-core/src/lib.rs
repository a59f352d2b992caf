//! moredis Core - Configuration, Parameters, and Errors
//!
//! Shared data model for the cache population pipeline. A run loads one
//! [`CacheDefinition`] from the YAML configuration, takes caller-supplied
//! [`RunParameters`], and reports failures through the error taxonomy in
//! [`error`].

pub mod config;
pub mod error;
pub mod params;

pub use config::{CacheDefinition, CollectionSpec, MapSpec, MoredisConfig};
pub use error::{
    ConfigError, MoredisError, MoredisResult, QueryError, SourceError, SourceResult, StoreError,
    StoreResult, TemplateError, TemplateResult,
};
pub use params::RunParameters;

/// Prefix for the shared counter and allocated hash keys.
pub const DEFAULT_KEY_PREFIX: &str = "moredis";

/// Number of queued writes that triggers an automatic flush.
pub const DEFAULT_FLUSH_INTERVAL: usize = 100;

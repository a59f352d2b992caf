//! moredis Populator - Build Redis Caches from MongoDB
//!
//! For every collection of a cache: allocate a fresh hash per map, stream the
//! matching documents into those hashes, then atomically repoint each map's
//! pointer key at its new hash and delete the hash it replaced.
//!
//! [`CachePopulator`] works against any [`HashStore`](moredis_storage::HashStore)
//! and [`DocumentSource`](moredis_storage::DocumentSource); [`build_cache`]
//! wires it to Redis and MongoDB.

pub mod build;
pub mod error;
pub mod populator;
pub mod settings;

pub use build::build_cache;
pub use error::{PopulateError, Stage};
pub use populator::{AllocatedMap, CachePopulator, CollectionReport, PopulateReport, SwappedMap};
pub use settings::PopulateSettings;

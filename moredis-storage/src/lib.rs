//! moredis Storage - Store and Source Traits, Adapters, and Fakes
//!
//! Defines the key-value store and document source capabilities the
//! populator is written against, the write-side primitives built on them
//! (batched writes, hash key allocation, reference swapping), and the
//! Redis, MongoDB, and in-memory implementations.

pub mod allocator;
pub mod memory;
pub mod mongo_source;
pub mod redis_backend;
pub mod swap;
pub mod traits;
pub mod writer;

pub use allocator::{allocate_hash_key, counter_key, hash_key};
pub use memory::{FindCall, MemoryCursor, MemorySource, MemoryStore, StoreOp};
pub use mongo_source::{resolve_database_name, MongoCursor, MongoSource, DEFAULT_DATABASE};
pub use redis_backend::RedisStore;
pub use swap::swap_reference;
pub use traits::{Command, DocumentSource, HashStore, RecordCursor};
pub use writer::BatchWriter;

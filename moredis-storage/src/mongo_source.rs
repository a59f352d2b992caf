//! MongoDB-backed [`DocumentSource`]

use crate::traits::{DocumentSource, RecordCursor};
use bson::{doc, Document};
use moredis_core::{SourceError, SourceResult};
use mongodb::sync::{Client, Cursor, Database};
use tracing::{debug, info};

/// A handle on the database named in the connection URL.
#[derive(Debug, Clone)]
pub struct MongoSource {
    database: Database,
}

impl MongoSource {
    /// Connect and ping. `host:port/db` is accepted as shorthand for
    /// `mongodb://host:port/db`. See [`resolve_database_name`] for which
    /// database is used.
    pub fn connect(address: &str, database: Option<&str>) -> SourceResult<Self> {
        let url = normalize_mongo_url(address);
        let connection_error = |reason: String| SourceError::Connection {
            address: address.to_string(),
            reason,
        };

        let client = Client::with_uri_str(&url).map_err(|e| connection_error(e.to_string()))?;
        let url_database = client.default_database();
        let name = resolve_database_name(database, url_database.as_ref().map(Database::name));
        let database = client.database(name);

        database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|e| connection_error(e.to_string()))?;
        info!(address = %address, database = %database.name(), "Connected to MongoDB");

        Ok(Self { database })
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

impl DocumentSource for MongoSource {
    type Cursor = MongoCursor;

    fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> SourceResult<MongoCursor> {
        debug!(collection = %collection, "Opening cursor");
        let coll = self.database.collection::<Document>(collection);
        let mut find = coll.find(filter);
        if let Some(projection) = projection {
            find = find.projection(projection);
        }
        let cursor = find.run().map_err(|e| SourceError::Query {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;

        Ok(MongoCursor {
            collection: collection.to_string(),
            cursor,
        })
    }
}

/// Forward-only cursor over a `find` result.
pub struct MongoCursor {
    collection: String,
    cursor: Cursor<Document>,
}

impl std::fmt::Debug for MongoCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoCursor")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl RecordCursor for MongoCursor {
    fn next_record(&mut self) -> SourceResult<Option<Document>> {
        self.cursor
            .next()
            .transpose()
            .map_err(|e| SourceError::Iteration {
                collection: self.collection.clone(),
                reason: e.to_string(),
            })
    }

    /// Dropping the driver cursor kills it server-side.
    fn close(self) -> SourceResult<()> {
        drop(self.cursor);
        Ok(())
    }
}

/// Database used when neither the caller nor the URL names one.
pub const DEFAULT_DATABASE: &str = "test";

/// An explicit, non-empty `requested` name wins, then the database named in
/// the URL, then [`DEFAULT_DATABASE`].
pub fn resolve_database_name<'a>(requested: Option<&'a str>, from_url: Option<&'a str>) -> &'a str {
    requested
        .filter(|name| !name.is_empty())
        .or_else(|| from_url.filter(|name| !name.is_empty()))
        .unwrap_or(DEFAULT_DATABASE)
}

/// Prepend `mongodb://` when no scheme is given.
pub fn normalize_mongo_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("mongodb://{}", address)
    }
}

//! Error types for moredis operations

use thiserror::Error;

/// Template compilation and execution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Template execution failed: {message}")]
    Execution { message: String },
}

/// Errors building a structured query from a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query template failed: {0}")]
    Template(#[from] TemplateError),

    #[error("Rendered query is not a JSON object ({reason}): {rendered}")]
    Parse { reason: String, rendered: String },
}

/// Key-value store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to connect to store at {address}: {reason}")]
    Connection { address: String, reason: String },

    #[error("Failed to allocate hash key from counter {counter}: {reason}")]
    Allocation { counter: String, reason: String },

    #[error("Store command {command} failed: {reason}")]
    Write { command: String, reason: String },

    #[error(
        "Pointer {pointer} now references {new_key} but deleting old map {old_key} failed: {reason}"
    )]
    SwapCleanup {
        pointer: String,
        old_key: String,
        new_key: String,
        reason: String,
    },
}

/// Document source errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Failed to connect to source at {address}: {reason}")]
    Connection { address: String, reason: String },

    #[error("Query against collection {collection} failed: {reason}")]
    Query { collection: String, reason: String },

    #[error("Cursor over collection {collection} failed: {reason}")]
    Iteration { collection: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config YAML: {reason}")]
    Yaml { reason: String },

    #[error("Cache not found in config: {name}")]
    CacheNotFound { name: String },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid params, expected a JSON object of strings: {reason}")]
    InvalidParams { reason: String },
}

/// Master error type for all moredis errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoredisError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for moredis operations.
pub type MoredisResult<T> = Result<T, MoredisError>;

pub type TemplateResult<T> = Result<T, TemplateError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type SourceResult<T> = Result<T, SourceError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_display_syntax() {
        let err = TemplateError::Syntax {
            message: "function \"nope\" not defined".to_string(),
            line: 2,
            column: 7,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("line 2"));
        assert!(msg.contains("column 7"));
        assert!(msg.contains("nope"));
    }

    #[test]
    fn test_query_error_display_parse() {
        let err = QueryError::Parse {
            reason: "expected value".to_string(),
            rendered: "{id: 5}".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expected value"));
        assert!(msg.contains("{id: 5}"));
    }

    #[test]
    fn test_store_error_display_swap_cleanup() {
        let err = StoreError::SwapCleanup {
            pointer: "users".to_string(),
            old_key: "moredis:maps:1".to_string(),
            new_key: "moredis:maps:2".to_string(),
            reason: "connection reset".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("users"));
        assert!(msg.contains("moredis:maps:1"));
        assert!(msg.contains("moredis:maps:2"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_source_error_display_iteration() {
        let err = SourceError::Iteration {
            collection: "users".to_string(),
            reason: "cursor killed".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("users"));
        assert!(msg.contains("cursor killed"));
    }

    #[test]
    fn test_config_error_display_cache_not_found() {
        let err = ConfigError::CacheNotFound {
            name: "districts".to_string(),
        };
        assert_eq!(format!("{}", err), "Cache not found in config: districts");
    }

    #[test]
    fn test_moredis_error_from_variants() {
        let template = MoredisError::from(TemplateError::Execution {
            message: "boom".to_string(),
        });
        assert!(matches!(template, MoredisError::Template(_)));

        let query = MoredisError::from(QueryError::Parse {
            reason: "eof".to_string(),
            rendered: String::new(),
        });
        assert!(matches!(query, MoredisError::Query(_)));

        let store = MoredisError::from(StoreError::Write {
            command: "HSET".to_string(),
            reason: "broken pipe".to_string(),
        });
        assert!(matches!(store, MoredisError::Store(_)));

        let source = MoredisError::from(SourceError::Query {
            collection: "users".to_string(),
            reason: "unauthorized".to_string(),
        });
        assert!(matches!(source, MoredisError::Source(_)));

        let config = MoredisError::from(ConfigError::MissingRequired {
            field: "caches".to_string(),
        });
        assert!(matches!(config, MoredisError::Config(_)));
    }

    #[test]
    fn test_moredis_result_collects_concern_errors() {
        fn write() -> StoreResult<()> {
            Err(StoreError::Write {
                command: "HSET h k v".to_string(),
                reason: "broken pipe".to_string(),
            })
        }
        fn step() -> MoredisResult<()> {
            write()?;
            Ok(())
        }
        assert!(matches!(
            step(),
            Err(MoredisError::Store(StoreError::Write { .. }))
        ));
    }

    #[test]
    fn test_query_error_wraps_template_error() {
        let err = QueryError::from(TemplateError::Syntax {
            message: "unclosed action".to_string(),
            line: 1,
            column: 1,
        });
        assert!(matches!(err, QueryError::Template(TemplateError::Syntax { .. })));
    }
}

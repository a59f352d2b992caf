//! moredis Test Utilities
//!
//! Shared test infrastructure for the moredis workspace:
//! - Proptest generators for records, parameters, and template fragments
//! - Fixtures for the configurations and record sets most tests need
//! - Re-exports of the in-memory store and source

pub use moredis_storage::{MemorySource, MemoryStore, StoreOp};

pub use moredis_core::{CacheDefinition, CollectionSpec, MapSpec, MoredisConfig, RunParameters};

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for moredis inputs.

    use super::*;
    use bson::{oid::ObjectId, Bson, Document};
    use proptest::prelude::*;

    /// A field name usable in a `{{.field}}` template.
    pub fn arb_field_name() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,11}"
    }

    /// Text that contains no template delimiters.
    pub fn arb_plain_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 :,._-]{0,24}"
    }

    pub fn arb_object_id() -> impl Strategy<Value = ObjectId> {
        any::<[u8; 12]>().prop_map(ObjectId::from_bytes)
    }

    /// A scalar BSON value that renders the same way in every context.
    pub fn arb_scalar() -> impl Strategy<Value = Bson> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,16}".prop_map(Bson::String),
            any::<i32>().prop_map(Bson::Int32),
            any::<i64>().prop_map(Bson::Int64),
            any::<bool>().prop_map(Bson::Boolean),
            Just(Bson::Null),
            arb_object_id().prop_map(Bson::ObjectId),
        ]
    }

    /// A flat record with string values.
    pub fn arb_string_record() -> impl Strategy<Value = Document> {
        proptest::collection::btree_map(arb_field_name(), "[a-zA-Z0-9]{0,12}", 0..8)
            .prop_map(|fields| {
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Bson::String(v)))
                    .collect()
            })
    }

    pub fn arb_run_parameters() -> impl Strategy<Value = RunParameters> {
        proptest::collection::btree_map(arb_field_name(), "[a-zA-Z0-9_-]{0,12}", 0..6)
            .prop_map(|params| params.into_iter().collect())
    }

    /// A document whose values are booleans or boolean-like strings.
    pub fn arb_flag_document() -> impl Strategy<Value = Document> {
        let flag = prop_oneof![
            any::<bool>().prop_map(Bson::Boolean),
            prop::sample::select(vec![
                "1", "t", "T", "TRUE", "true", "True", "0", "f", "F", "FALSE", "false", "False",
            ])
            .prop_map(|s| Bson::String(s.to_string())),
        ];
        proptest::collection::btree_map(arb_field_name(), flag, 0..8)
            .prop_map(|flags| flags.into_iter().collect())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use bson::{doc, Document};

    /// A configuration file with two caches.
    pub const SAMPLE_CONFIG_YAML: &str = r#"
caches:
  - name: districts
    collections:
      - collection: schools
        query: '{"district": "{{.district}}"}'
        projection: '{"name": 1, "sis_id": 1}'
        maps:
          - name: "schools:{{.district}}"
            key: "{{.sis_id}}"
            val: "{{toString ._id}}"
          - name: "school_names:{{.district}}"
            key: "{{toString ._id}}"
            val: "{{.name}}"
  - name: users
    collections:
      - collection: users
        query: '{}'
        maps:
          - name: users_by_email
            key: "{{toLower .email}}"
            val: "{{toString ._id}}"
"#;

    pub fn sample_config() -> MoredisConfig {
        MoredisConfig {
            caches: vec![
                CacheDefinition {
                    name: "districts".to_string(),
                    collections: vec![CollectionSpec {
                        collection: "schools".to_string(),
                        query: r#"{"district": "{{.district}}"}"#.to_string(),
                        projection: Some(r#"{"name": 1, "sis_id": 1}"#.to_string()),
                        maps: vec![
                            map_spec("schools:{{.district}}", "{{.sis_id}}", "{{toString ._id}}"),
                            map_spec("school_names:{{.district}}", "{{toString ._id}}", "{{.name}}"),
                        ],
                    }],
                },
                CacheDefinition {
                    name: "users".to_string(),
                    collections: vec![CollectionSpec {
                        collection: "users".to_string(),
                        query: "{}".to_string(),
                        projection: None,
                        maps: vec![map_spec(
                            "users_by_email",
                            "{{toLower .email}}",
                            "{{toString ._id}}",
                        )],
                    }],
                },
            ],
        }
    }

    pub fn map_spec(name: &str, key: &str, value: &str) -> MapSpec {
        MapSpec {
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// A cache with one collection and the given maps.
    pub fn single_collection_cache(
        cache: &str,
        collection: &str,
        query: &str,
        maps: Vec<MapSpec>,
    ) -> CacheDefinition {
        CacheDefinition {
            name: cache.to_string(),
            collections: vec![CollectionSpec {
                collection: collection.to_string(),
                query: query.to_string(),
                projection: None,
                maps,
            }],
        }
    }

    /// `{test: "1", val: "expected"}` and `{test: "2", val: "expected"}`.
    pub fn expected_records() -> Vec<Document> {
        vec![
            doc! { "test": "1", "val": "expected" },
            doc! { "test": "2", "val": "expected" },
        ]
    }

    pub fn params(pairs: &[(&str, &str)]) -> RunParameters {
        pairs.iter().copied().collect()
    }
}

//! Query construction
//!
//! Query and projection templates render to JSON text, which is parsed into a
//! BSON document. Strings shaped like an ObjectId are then coerced, so a
//! template such as `{"_id": "{{.id}}"}` matches by identifier.

use crate::template::render;
use bson::{oid::ObjectId, Bson, Document};
use moredis_core::{CollectionSpec, QueryError, RunParameters};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

static OBJECT_ID_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{24}$").expect("Invalid ObjectId regex"));

/// A filter and optional projection ready to hand to a document source.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub filter: Document,
    pub projection: Option<Document>,
}

/// Build the filter and projection for one collection.
pub fn build_query(spec: &CollectionSpec, params: &RunParameters) -> Result<BuiltQuery, QueryError> {
    let context = params.to_document();

    let filter = parse_templated_json(&spec.query, &context)?;
    let projection = spec
        .projection_template()
        .map(|template| parse_templated_json(template, &context))
        .transpose()?;

    Ok(BuiltQuery { filter, projection })
}

/// Render `template` against `context` and parse the result as a JSON
/// object, coercing ObjectId-shaped strings.
pub fn parse_templated_json(template: &str, context: &Document) -> Result<Document, QueryError> {
    let rendered = render(template, context)?;

    let json: JsonValue = serde_json::from_str(&rendered).map_err(|e| QueryError::Parse {
        reason: e.to_string(),
        rendered: rendered.clone(),
    })?;

    let JsonValue::Object(map) = json else {
        return Err(QueryError::Parse {
            reason: "expected a JSON object".to_string(),
            rendered,
        });
    };

    let mut doc: Document = map
        .into_iter()
        .map(|(key, value)| (key, json_to_bson(value)))
        .collect();
    set_object_ids(&mut doc);
    Ok(doc)
}

/// Replace ObjectId-shaped strings with ObjectIds. Nested documents are
/// walked; arrays are left as they are.
pub fn set_object_ids(doc: &mut Document) {
    for (_, value) in doc.iter_mut() {
        match value {
            Bson::String(s) if is_object_id_hex(s.as_str()) => {
                if let Ok(oid) = ObjectId::parse_str(s.as_str()) {
                    *value = Bson::ObjectId(oid);
                }
            }
            Bson::Document(nested) => set_object_ids(nested),
            _ => {}
        }
    }
}

/// True for exactly 24 lowercase hex characters.
pub fn is_object_id_hex(s: &str) -> bool {
    OBJECT_ID_HEX.is_match(s)
}

fn json_to_bson(value: JsonValue) -> Bson {
    match value {
        JsonValue::Null => Bson::Null,
        JsonValue::Bool(b) => Bson::Boolean(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Bson::String(s),
        JsonValue::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        JsonValue::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(key, value)| (key, json_to_bson(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use moredis_core::{MapSpec, TemplateError};

    const HEX: &str = "5f1b2c3d4e5f60718293a4b5";

    fn spec(query: &str, projection: Option<&str>) -> CollectionSpec {
        CollectionSpec {
            collection: "users".to_string(),
            query: query.to_string(),
            projection: projection.map(str::to_string),
            maps: vec![MapSpec {
                name: "users".to_string(),
                key: "{{.id}}".to_string(),
                value: "{{.name}}".to_string(),
            }],
        }
    }

    #[test]
    fn test_build_query_with_params() {
        let mut params = RunParameters::new();
        params.insert("tenant", "acme");

        let built = build_query(
            &spec(r#"{"tenant": "{{.tenant}}", "age": {"$gt": 3}}"#, None),
            &params,
        )
        .unwrap();

        assert_eq!(
            built.filter,
            doc! { "tenant": "acme", "age": { "$gt": 3_i64 } }
        );
        assert_eq!(built.projection, None);
    }

    #[test]
    fn test_build_query_with_projection() {
        let built = build_query(
            &spec("{}", Some(r#"{"name": 1, "_id": 0}"#)),
            &RunParameters::new(),
        )
        .unwrap();
        assert_eq!(built.filter, doc! {});
        assert_eq!(built.projection, Some(doc! { "name": 1_i64, "_id": 0_i64 }));
    }

    #[test]
    fn test_empty_projection_is_ignored() {
        let built = build_query(&spec("{}", Some("")), &RunParameters::new()).unwrap();
        assert_eq!(built.projection, None);
    }

    #[test]
    fn test_object_id_coercion() {
        let mut params = RunParameters::new();
        params.insert("id", HEX);

        let built = build_query(
            &spec(r#"{"_id": "{{.id}}", "nested": {"ref": "{{.id}}"}, "name": "plain"}"#, None),
            &params,
        )
        .unwrap();

        let oid = ObjectId::parse_str(HEX).unwrap();
        assert_eq!(
            built.filter,
            doc! { "_id": oid, "nested": { "ref": oid }, "name": "plain" }
        );
    }

    #[test]
    fn test_arrays_are_not_coerced() {
        let rendered = format!(r#"{{"ids": {{"$in": ["{}"]}}}}"#, HEX);
        let doc = parse_templated_json(&rendered, &doc! {}).unwrap();
        assert_eq!(doc, doc! { "ids": { "$in": [HEX] } });
    }

    #[test]
    fn test_is_object_id_hex() {
        assert!(is_object_id_hex(HEX));
        assert!(!is_object_id_hex("5F1B2C3D4E5F60718293A4B5"));
        assert!(!is_object_id_hex("5f1b2c3d4e5f60718293a4b"));
        assert!(!is_object_id_hex("5f1b2c3d4e5f60718293a4b5a"));
        assert!(!is_object_id_hex("zf1b2c3d4e5f60718293a4b5"));
    }

    #[test]
    fn test_non_object_json_is_parse_error() {
        let err = parse_templated_json("[1, 2]", &doc! {}).unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));

        let err = parse_templated_json("{not json", &doc! {}).unwrap_err();
        match err {
            QueryError::Parse { rendered, .. } => assert_eq!(rendered, "{not json"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_template_failure_propagates() {
        let err = parse_templated_json("{{nonExistentFunc}}", &doc! {}).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Template(TemplateError::Syntax { .. })
        ));
    }

    #[test]
    fn test_floats_and_nulls() {
        let doc = parse_templated_json(r#"{"f": 1.5, "n": null, "b": true}"#, &doc! {}).unwrap();
        assert_eq!(doc, doc! { "f": 1.5, "n": null, "b": true });
    }
}

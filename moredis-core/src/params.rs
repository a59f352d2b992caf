//! Caller-supplied run parameters

use crate::error::ConfigError;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Flat string parameters substituted into query, projection, and pointer-name
/// templates. Never visible to key/value templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunParameters(BTreeMap<String, String>);

impl RunParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy the parameters into a document usable as a template context.
    pub fn to_document(&self) -> Document {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), Bson::String(v.clone())))
            .collect()
    }
}

impl FromStr for RunParameters {
    type Err = ConfigError;

    /// Parse a JSON object whose values are all strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| ConfigError::InvalidParams {
            reason: e.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for RunParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (ix, (key, value)) in self.0.iter().enumerate() {
            if ix > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_json_object() {
        let params: RunParameters = r#"{"district": "abc", "env": "prod"}"#.parse().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("district"), Some("abc"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_parse_rejects_non_string_values() {
        let err = r#"{"count": 5}"#.parse::<RunParameters>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParams { .. }));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(r#"["a"]"#.parse::<RunParameters>().is_err());
        assert!("not json".parse::<RunParameters>().is_err());
    }

    #[test]
    fn test_to_document() {
        let params: RunParameters = [("a", "1"), ("b", "two")].into_iter().collect();
        let doc = params.to_document();
        assert_eq!(doc.get_str("a").unwrap(), "1");
        assert_eq!(doc.get_str("b").unwrap(), "two");
    }

    #[test]
    fn test_display_is_sorted() {
        let params: RunParameters = [("z", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(params.to_string(), "{a: 2, z: 1}");
    }

    proptest! {
        /// Every parsed parameter is visible in the template context.
        #[test]
        fn prop_document_mirrors_params(
            entries in proptest::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..8)
        ) {
            let json = serde_json::to_string(&entries).unwrap();
            let params: RunParameters = json.parse().unwrap();
            let doc = params.to_document();
            prop_assert_eq!(doc.len(), entries.len());
            for (key, value) in &entries {
                prop_assert_eq!(doc.get_str(key).unwrap(), value.as_str());
            }
        }
    }
}

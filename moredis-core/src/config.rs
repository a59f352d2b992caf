//! Mapping configuration types
//!
//! The configuration file lists caches; each cache lists the collections it is
//! built from and the maps each collection feeds. Every string that ends up in
//! a query, a pointer name, a key, or a value is a template.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoredisConfig {
    pub caches: Vec<CacheDefinition>,
}

/// A named cache: the unit a single run populates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheDefinition {
    pub name: String,
    #[serde(default)]
    pub collections: Vec<CollectionSpec>,
}

/// One source collection and the maps built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSpec {
    /// Source collection name.
    pub collection: String,
    /// Template rendering a JSON filter object.
    pub query: String,
    /// Template rendering a JSON projection object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    #[serde(default)]
    pub maps: Vec<MapSpec>,
}

/// A single hash built from a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapSpec {
    /// Pointer-name template, rendered against run parameters.
    pub name: String,
    /// Field template, rendered against each source record.
    pub key: String,
    /// Value template, rendered against each source record.
    #[serde(rename = "val")]
    pub value: String,
}

impl MoredisConfig {
    /// Read and parse a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse YAML configuration text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Yaml {
            reason: e.to_string(),
        })
    }

    /// Find a cache by name.
    pub fn cache(&self, name: &str) -> Result<&CacheDefinition, ConfigError> {
        self.caches
            .iter()
            .find(|cache| cache.name == name)
            .ok_or_else(|| ConfigError::CacheNotFound {
                name: name.to_string(),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (ix, cache) in self.caches.iter().enumerate() {
            cache.validate_at(&format!("caches[{}]", ix))?;
        }
        Ok(())
    }
}

impl CacheDefinition {
    /// Check that every required template is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_at("cache")
    }

    fn validate_at(&self, path: &str) -> Result<(), ConfigError> {
        require(&self.name, &format!("{}.name", path))?;
        for (cx, collection) in self.collections.iter().enumerate() {
            let path = format!("{}.collections[{}]", path, cx);
            require(&collection.collection, &format!("{}.collection", path))?;
            require(&collection.query, &format!("{}.query", path))?;
            for (mx, map) in collection.maps.iter().enumerate() {
                let path = format!("{}.maps[{}]", path, mx);
                require(&map.name, &format!("{}.name", path))?;
                require(&map.key, &format!("{}.key", path))?;
                require(&map.value, &format!("{}.val", path))?;
            }
        }
        Ok(())
    }
}

impl CollectionSpec {
    /// The projection template, if one is configured and non-empty.
    pub fn projection_template(&self) -> Option<&str> {
        self.projection.as_deref().filter(|p| !p.is_empty())
    }
}

fn require(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            field: field.to_string(),
        });
    }
    Ok(())
}

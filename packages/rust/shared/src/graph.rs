//! Graph data model: entities, relationships and their declared schemas.
//!
//! Entities and relationships serialize to the underscore-prefixed shape the
//! downstream asset graph expects (`_key`, `_type`, `_class`, ...). Provider
//! specific fields are flattened next to them. Absent values are omitted,
//! never written as `null`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CloudGraphError, Result};

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Declared shape of an entity a step may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Human-readable resource name (e.g. `[RM] Key Vault`).
    pub resource_name: &'static str,
    pub entity_type: &'static str,
    pub class: &'static [&'static str],
}

/// Declared shape of a relationship a step may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipSchema {
    pub rel_type: &'static str,
    pub source_type: &'static str,
    pub class: RelationshipClass,
    pub target_type: &'static str,
}

impl RelationshipSchema {
    /// Build a relationship of this schema between two known keys.
    pub fn create(&self, from_key: &str, to_key: &str) -> Relationship {
        Relationship::new(
            self.class,
            from_key,
            self.source_type,
            to_key,
            self.target_type,
        )
        .with_type(self.rel_type)
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Derive an entity key from a provider identifier.
///
/// Identity on the trimmed identifier, which keeps the mapping injective over
/// distinct IDs. Empty identifiers cannot be keys.
pub fn generate_entity_key(id: &str) -> Result<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CloudGraphError::validation("cannot derive entity key from empty id"));
    }
    Ok(trimmed.to_string())
}

/// `{fromKey}|{class}|{toKey}`, the dedup key of a relationship.
pub fn generate_relationship_key(from_key: &str, class: RelationshipClass, to_key: &str) -> String {
    format!("{from_key}|{}|{to_key}", class.as_lower())
}

/// Default `_type` of a relationship.
///
/// The target type loses the leading segments it shares with the source type,
/// so `azure_resource_group` HAS `azure_keyvault_service` becomes
/// `azure_resource_group_has_keyvault_service`. When nothing is left, the
/// target's last segment is kept.
pub fn generate_relationship_type(
    class: RelationshipClass,
    from_type: &str,
    to_type: &str,
) -> String {
    let from_parts: Vec<&str> = from_type.split('_').collect();
    let to_parts: Vec<&str> = to_type.split('_').collect();

    let shared = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let remainder = if shared >= to_parts.len() {
        to_parts.last().copied().unwrap_or_default().to_string()
    } else {
        to_parts[shared..].join("_")
    };

    format!("{from_type}_{}_{remainder}", class.as_lower())
}

// ---------------------------------------------------------------------------
// RelationshipClass
// ---------------------------------------------------------------------------

/// Semantic class of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationshipClass {
    Has,
    Uses,
    Contains,
    Identified,
    Protects,
    Connects,
}

impl RelationshipClass {
    /// Upper-case form, used for `_class` and `displayName`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Has => "HAS",
            Self::Uses => "USES",
            Self::Contains => "CONTAINS",
            Self::Identified => "IDENTIFIED",
            Self::Protects => "PROTECTS",
            Self::Connects => "CONNECTS",
        }
    }

    /// Lower-case form, used in generated keys and types.
    pub fn as_lower(&self) -> &'static str {
        match self {
            Self::Has => "has",
            Self::Uses => "uses",
            Self::Contains => "contains",
            Self::Identified => "identified",
            Self::Protects => "protects",
            Self::Connects => "connects",
        }
    }
}

impl fmt::Display for RelationshipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A named copy of the provider payload an entity was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub name: String,
    #[serde(rename = "rawData")]
    pub raw_data: Value,
}

/// A normalized graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub entity_type: String,
    #[serde(rename = "_class")]
    pub class: Vec<String>,
    #[serde(rename = "_rawData", default, skip_serializing_if = "Vec::is_empty")]
    pub raw_data: Vec<RawData>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Start an entity of the given schema.
    pub fn new(key: impl Into<String>, schema: &EntitySchema) -> Self {
        Self {
            key: key.into(),
            entity_type: schema.entity_type.to_string(),
            class: schema.class.iter().map(|c| c.to_string()).collect(),
            raw_data: Vec::new(),
            properties: Map::new(),
        }
    }

    /// Set a property; `None` values are left out.
    pub fn with(mut self, name: &str, value: impl Serialize) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property in place; `None` values remove nothing and add nothing.
    pub fn set(&mut self, name: &str, value: impl Serialize) {
        match serde_json::to_value(value) {
            Ok(Value::Null) | Err(_) => {}
            Ok(v) => {
                self.properties.insert(name.to_string(), v);
            }
        }
    }

    /// Copy provider tags as `tag.<Name>` properties and lift the listed tag
    /// names to top-level properties.
    pub fn with_tags(mut self, tags: Option<&BTreeMap<String, String>>, lifted: &[&str]) -> Self {
        let Some(tags) = tags else {
            return self;
        };
        for (name, value) in tags {
            self.properties
                .insert(format!("tag.{name}"), Value::String(value.clone()));
        }
        for name in lifted {
            if let Some(value) = tags.get(*name) {
                self.properties
                    .insert((*name).to_string(), Value::String(value.clone()));
            }
        }
        self
    }

    /// Attach a named copy of a provider payload.
    pub fn with_raw_data(mut self, name: &str, data: impl Serialize) -> Self {
        if let Ok(raw) = serde_json::to_value(data) {
            self.raw_data.push(RawData {
                name: name.to_string(),
                raw_data: raw,
            });
        }
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.str_property("displayName")
    }

    /// Deserialize this entity into a typed view of its fields.
    pub fn project<T: DeserializeOwned>(&self) -> Result<T> {
        let value = serde_json::to_value(self)
            .map_err(|e| CloudGraphError::parse(format!("{}: {e}", self.key)))?;
        serde_json::from_value(value)
            .map_err(|e| CloudGraphError::parse(format!("{}: {e}", self.key)))
    }
}

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// A directed, typed edge between two entity keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub rel_type: String,
    #[serde(rename = "_class")]
    pub class: RelationshipClass,
    #[serde(rename = "_fromEntityKey")]
    pub from_key: String,
    #[serde(rename = "_fromEntityType")]
    pub from_type: String,
    #[serde(rename = "_toEntityKey")]
    pub to_key: String,
    #[serde(rename = "_toEntityType")]
    pub to_type: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Relationship {
    /// Create a relationship with a generated key and type.
    pub fn new(
        class: RelationshipClass,
        from_key: &str,
        from_type: &str,
        to_key: &str,
        to_type: &str,
    ) -> Self {
        Self {
            key: generate_relationship_key(from_key, class, to_key),
            rel_type: generate_relationship_type(class, from_type, to_type),
            class,
            from_key: from_key.to_string(),
            from_type: from_type.to_string(),
            to_key: to_key.to_string(),
            to_type: to_type.to_string(),
            display_name: class.as_str().to_string(),
            properties: Map::new(),
        }
    }

    /// Create a relationship between two stored entities.
    pub fn between(class: RelationshipClass, from: &Entity, to: &Entity) -> Self {
        Self::new(class, &from.key, &from.entity_type, &to.key, &to.entity_type)
    }

    /// Override the generated `_type`.
    pub fn with_type(mut self, rel_type: &str) -> Self {
        self.rel_type = rel_type.to_string();
        self
    }

    /// Set a property; `None` values are left out.
    pub fn with(mut self, name: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            if !v.is_null() {
                self.properties.insert(name.to_string(), v);
            }
        }
        self
    }
}

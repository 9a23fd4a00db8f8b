//! Entities, entity types, and typed properties
//!
//! An [`Entity`] is any persistable domain object: it has a stable identity,
//! a kind, an entity type (which may carry a user-authored validation
//! script), and a bag of typed user-defined properties.

use crate::types::{EntityId, EntityKind, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed value of a user-defined property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Free text
    Text(String),
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// Boolean flag
    Boolean(bool),
    /// Point in time
    Timestamp(DateTime<Utc>),
}

/// User-authored validation logic attached to an entity type
///
/// The script body is opaque to this core; the validation engine resolves
/// `name` to executable logic and evaluates it against an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationScript {
    /// Registered name of the script
    pub name: String,
    /// Script source, kept for diagnostics only
    pub source: String,
}

impl ValidationScript {
    /// Create a script reference by name, with an empty source body.
    pub fn named(name: impl Into<String>) -> Self {
        ValidationScript {
            name: name.into(),
            source: String::new(),
        }
    }
}

/// Type descriptor for an entity: a code plus an optional validation script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type code, e.g. "BACTERIA"
    pub code: String,
    /// Validation script evaluated before commit, if any
    pub validation_script: Option<ValidationScript>,
}

impl EntityType {
    /// Type with no validation script
    pub fn new(code: impl Into<String>) -> Self {
        EntityType {
            code: code.into(),
            validation_script: None,
        }
    }

    /// Type with a named validation script
    pub fn with_script(code: impl Into<String>, script: ValidationScript) -> Self {
        EntityType {
            code: code.into(),
            validation_script: Some(script),
        }
    }
}

/// A persistable domain object carrying typed user-defined properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identity
    pub id: EntityId,
    /// Kind, fixed at creation
    pub kind: EntityKind,
    /// Type descriptor (carries the optional validation script)
    pub entity_type: EntityType,
    /// User-defined properties, keyed by property code
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Entity {
    /// Create an entity with no properties
    pub fn new(id: EntityId, kind: EntityKind, entity_type: EntityType) -> Self {
        Entity {
            id,
            kind,
            entity_type,
            properties: BTreeMap::new(),
        }
    }

    /// Set a property, replacing any previous value under the same code
    pub fn with_property(mut self, code: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(code.into(), value);
        self
    }

    /// Look up a property by code
    pub fn property(&self, code: &str) -> Option<&PropertyValue> {
        self.properties.get(code)
    }

    /// Human-readable reference: kind, identity, type code
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id, self.entity_type.code.clone())
    }

    /// Validation script of this entity's type, if any
    pub fn validation_script(&self) -> Option<&ValidationScript> {
        self.entity_type.validation_script.as_ref()
    }
}

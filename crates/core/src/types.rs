//! Entity identity and kind descriptors
//!
//! Every persistable object carries a stable [`EntityId`] and an
//! [`EntityKind`]. Capabilities (property holding, authorization relevance,
//! write-lock guarding) are decided once per kind, not by inspecting the
//! runtime type of an instance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable database identity of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create an entity id
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of persistent entity kinds
///
/// Each kind carries a small set of capabilities:
/// - property holders participate in validation and dynamic-property
///   recomputation
/// - authorization-relevant kinds trigger a session cache refresh when
///   a transaction touching them commits
/// - lock-guarded kinds are serialized across concurrent transactions by
///   the sample modification lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Laboratory sample; the only lock-guarded kind
    Sample,
    /// Experiment
    Experiment,
    /// Data set produced by an experiment or sample
    DataSet,
    /// Material
    Material,
    /// Project grouping experiments
    Project,
    /// Space (tenant boundary); authorization-relevant
    Space,
    /// Role assignment; authorization-relevant
    RoleAssignment,
    /// Authorization group; authorization-relevant
    AuthorizationGroup,
}

impl EntityKind {
    /// Whether entities of this kind carry user-defined typed properties
    /// and an entity-type-level validation script.
    pub fn has_properties(&self) -> bool {
        matches!(
            self,
            EntityKind::Sample | EntityKind::Experiment | EntityKind::DataSet | EntityKind::Material
        )
    }

    /// Whether a committed change to this kind requires all live sessions
    /// to refresh their cached permissions.
    pub fn is_authorization_relevant(&self) -> bool {
        matches!(
            self,
            EntityKind::RoleAssignment | EntityKind::AuthorizationGroup | EntityKind::Space
        )
    }

    /// Whether writes to this kind are serialized by the process-wide
    /// sample modification lock.
    pub fn is_lock_guarded(&self) -> bool {
        matches!(self, EntityKind::Sample)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Sample => "Sample",
            EntityKind::Experiment => "Experiment",
            EntityKind::DataSet => "DataSet",
            EntityKind::Material => "Material",
            EntityKind::Project => "Project",
            EntityKind::Space => "Space",
            EntityKind::RoleAssignment => "RoleAssignment",
            EntityKind::AuthorizationGroup => "AuthorizationGroup",
        };
        write!(f, "{}", name)
    }
}

/// Human-readable reference to an entity: kind, identity, and type code
///
/// Used wherever an entity must be named in a message shown to the caller,
/// most prominently in validation rollback reasons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Kind of the referenced entity
    pub kind: EntityKind,
    /// Identity of the referenced entity
    pub id: EntityId,
    /// Code of the entity's type
    pub type_code: String,
}

impl EntityRef {
    /// Create an entity reference
    pub fn new(kind: EntityKind, id: EntityId, type_code: impl Into<String>) -> Self {
        EntityRef {
            kind,
            id,
            type_code: type_code.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.id, self.type_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_holder_kinds() {
        assert!(EntityKind::Sample.has_properties());
        assert!(EntityKind::Experiment.has_properties());
        assert!(EntityKind::DataSet.has_properties());
        assert!(EntityKind::Material.has_properties());
        assert!(!EntityKind::Space.has_properties());
        assert!(!EntityKind::RoleAssignment.has_properties());
    }

    #[test]
    fn test_authorization_relevant_kinds() {
        assert!(EntityKind::RoleAssignment.is_authorization_relevant());
        assert!(EntityKind::AuthorizationGroup.is_authorization_relevant());
        assert!(EntityKind::Space.is_authorization_relevant());
        assert!(!EntityKind::Sample.is_authorization_relevant());
        assert!(!EntityKind::Project.is_authorization_relevant());
    }

    #[test]
    fn test_only_samples_are_lock_guarded() {
        assert!(EntityKind::Sample.is_lock_guarded());
        for kind in [
            EntityKind::Experiment,
            EntityKind::DataSet,
            EntityKind::Material,
            EntityKind::Project,
            EntityKind::Space,
            EntityKind::RoleAssignment,
            EntityKind::AuthorizationGroup,
        ] {
            assert!(!kind.is_lock_guarded(), "{} must not be lock guarded", kind);
        }
    }

    #[test]
    fn test_entity_ref_display() {
        let r = EntityRef::new(EntityKind::Sample, EntityId::new(42), "BACTERIA");
        assert_eq!(r.to_string(), "Sample 42 (BACTERIA)");
    }

    #[test]
    fn test_entity_id_ordering() {
        assert!(EntityId::new(1) < EntityId::new(2));
        assert_eq!(EntityId::new(7).as_u64(), 7);
    }
}

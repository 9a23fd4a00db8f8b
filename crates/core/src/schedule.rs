//! Scheduled-work requests
//!
//! Ephemeral requests produced inside a transaction and moved to a durable
//! backlog only if that transaction commits: dynamic-property recomputation
//! and full-text index updates. Neither has independent identity; both are
//! expected to be idempotent on the consumer side, so duplicates are
//! tolerated.

use crate::entity::Entity;
use crate::types::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// What a recomputation request points at: full entities or bare identities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvaluationTargets {
    /// Identities only; the consumer loads the entities itself
    Ids(Vec<EntityId>),
    /// Full entity snapshots
    Entities(Vec<Entity>),
}

impl EvaluationTargets {
    /// Identities covered by this target set
    pub fn ids(&self) -> Vec<EntityId> {
        match self {
            EvaluationTargets::Ids(ids) => ids.clone(),
            EvaluationTargets::Entities(entities) => entities.iter().map(|e| e.id).collect(),
        }
    }
}

/// Request to recompute the dynamic properties of some entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvaluation {
    /// Kind of the targeted entities
    pub kind: EntityKind,
    /// The entities to recompute
    pub targets: EvaluationTargets,
}

impl ScheduledEvaluation {
    /// Request recomputation for a set of entity ids
    pub fn for_ids(kind: EntityKind, ids: Vec<EntityId>) -> Self {
        ScheduledEvaluation {
            kind,
            targets: EvaluationTargets::Ids(ids),
        }
    }

    /// Request recomputation for full entities
    pub fn for_entities(kind: EntityKind, entities: Vec<Entity>) -> Self {
        ScheduledEvaluation {
            kind,
            targets: EvaluationTargets::Entities(entities),
        }
    }
}

/// Request to refresh the full-text index for some entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUpdateRequest {
    /// Kind of the entities to re-index
    pub kind: EntityKind,
    /// Identities of the entities to re-index
    pub ids: Vec<EntityId>,
}

impl IndexUpdateRequest {
    /// Create an index update request
    pub fn new(kind: EntityKind, ids: Vec<EntityId>) -> Self {
        IndexUpdateRequest { kind, ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn test_targets_ids_from_entities() {
        let entities = vec![
            Entity::new(EntityId::new(1), EntityKind::Sample, EntityType::new("T")),
            Entity::new(EntityId::new(2), EntityKind::Sample, EntityType::new("T")),
        ];
        let req = ScheduledEvaluation::for_entities(EntityKind::Sample, entities);
        assert_eq!(req.targets.ids(), vec![EntityId::new(1), EntityId::new(2)]);
    }

    #[test]
    fn test_targets_ids_pass_through() {
        let req = ScheduledEvaluation::for_ids(EntityKind::DataSet, vec![EntityId::new(5)]);
        assert_eq!(req.targets.ids(), vec![EntityId::new(5)]);
    }
}

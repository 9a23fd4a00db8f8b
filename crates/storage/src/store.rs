//! In-memory entity store
//!
//! Keeps committed entities keyed by (kind, id). The transaction manager
//! buffers writes per transaction and flushes them here in one call after
//! pre-commit validation has passed, so the store never sees a partial
//! transaction.

use limsdb_core::{Entity, EntityId, EntityKind, EntityRef, Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Composite record key: kind plus identity
type RecordKey = (EntityKind, EntityId);

/// In-memory persistence store for typed entity records
///
/// All reads take the shared lock; a transaction flush takes the exclusive
/// lock once and applies every buffered write under it.
#[derive(Debug, Default)]
pub struct EntityStore {
    records: RwLock<HashMap<RecordKey, Entity>>,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        EntityStore::default()
    }

    /// Load an entity by kind and id
    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<Entity> {
        self.records.read().get(&(kind, id)).cloned()
    }

    /// Whether an entity exists
    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        self.records.read().contains_key(&(kind, id))
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All entities of one kind, in unspecified order
    pub fn of_kind(&self, kind: EntityKind) -> Vec<Entity> {
        self.records
            .read()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Flush a transaction's buffered writes in one exclusive-lock hold
    ///
    /// Inserts must not collide with existing records. Updates must reference
    /// an existing record or one inserted in the same batch — a transaction
    /// may create an entity and modify it again before committing, and both
    /// writes arrive in one flush. A violation here means the transaction
    /// layer let an inconsistent write set through.
    ///
    /// # Errors
    /// `Error::Storage` on an insert of an existing id or an update/delete
    /// of a missing one. Nothing is applied in that case.
    pub fn apply(
        &self,
        inserts: &[Entity],
        updates: &[Entity],
        deletes: &[EntityRef],
    ) -> Result<()> {
        let mut records = self.records.write();

        for entity in inserts {
            if records.contains_key(&(entity.kind, entity.id)) {
                return Err(Error::Storage(format!(
                    "insert of existing entity {}",
                    entity.entity_ref()
                )));
            }
        }
        for entity in updates {
            let key = (entity.kind, entity.id);
            if !records.contains_key(&key) && !inserts.iter().any(|e| (e.kind, e.id) == key) {
                return Err(Error::Storage(format!(
                    "update of unknown entity {}",
                    entity.entity_ref()
                )));
            }
        }
        for entity_ref in deletes {
            if !records.contains_key(&(entity_ref.kind, entity_ref.id)) {
                return Err(Error::Storage(format!(
                    "delete of unknown entity {}",
                    entity_ref
                )));
            }
        }

        for entity in inserts.iter().chain(updates.iter()) {
            records.insert((entity.kind, entity.id), entity.clone());
        }
        for entity_ref in deletes {
            records.remove(&(entity_ref.kind, entity_ref.id));
        }

        debug!(
            target: "limsdb::store",
            inserts = inserts.len(),
            updates = updates.len(),
            deletes = deletes.len(),
            "Write set applied"
        );
        Ok(())
    }
}

//! Pre-commit entity validation
//!
//! Every entity created or modified in a transaction is checked against its
//! type's validation script before the transaction may commit. The
//! coordinator tracks new and modified property-holder entities as write
//! notifications arrive and runs a fixed-order validation pass at the
//! pre-commit point:
//!
//! 1. `ValidatingNew`: every new entity, in registration order
//! 2. `ValidatingQueued`: modified-but-not-yet-validated entities through a
//!    FIFO queue, together with any re-validation requests issued by scripts
//!
//! An entity is marked validated *before* its script runs, which gives both
//! at-most-once evaluation per transaction and guaranteed termination of
//! script-triggered re-validation chains. The first failure aborts the
//! transaction; the coordinator never retries after ordering a rollback.

use crate::observer::EntityObserver;
use crate::transaction::TransactionContext;
use limsdb_core::{
    Entity, EntityId, EntityKind, Error, Result, ValidationEngine, ValidationRequests,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

type EntityKey = (EntityKind, EntityId);

/// Phase of the per-transaction validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// Transaction open, validation not yet started
    Idle,
    /// Validating entities registered as new
    ValidatingNew,
    /// Draining the validation queue (modified + requested entities)
    ValidatingQueued,
    /// Terminal: queue empty, or the transaction is already doomed
    Done,
}

/// One entity awaiting validation, with the new/modified flag the engine sees
#[derive(Debug, Clone)]
struct QueuedValidation {
    entity: Entity,
    is_new: bool,
}

/// Transaction-scoped validation bookkeeping
///
/// Tracks the disjoint "new" and "modified" sets, the entities already
/// validated, and the FIFO queue of entities still awaiting validation.
/// Created fresh per transaction and discarded with it, whatever the
/// outcome.
#[derive(Debug)]
pub struct PendingValidationSet {
    new_entities: Vec<Entity>,
    new_keys: HashSet<EntityKey>,
    modified_entities: Vec<Entity>,
    modified_keys: HashSet<EntityKey>,
    validated: HashSet<EntityKey>,
    queue: VecDeque<QueuedValidation>,
    phase: ValidationPhase,
}

impl PendingValidationSet {
    /// Create empty bookkeeping for a fresh transaction
    pub fn new() -> Self {
        PendingValidationSet {
            new_entities: Vec::new(),
            new_keys: HashSet::new(),
            modified_entities: Vec::new(),
            modified_keys: HashSet::new(),
            validated: HashSet::new(),
            queue: VecDeque::new(),
            phase: ValidationPhase::Idle,
        }
    }

    /// Current phase of the validation pass
    pub fn phase(&self) -> ValidationPhase {
        self.phase
    }

    /// Register an insert-type write of a property holder
    ///
    /// A repeated insert notification for the same entity replaces the
    /// stored snapshot so validation sees the latest state.
    pub fn register_new(&mut self, entity: Entity) {
        let key = (entity.kind, entity.id);
        if self.new_keys.insert(key) {
            self.new_entities.push(entity);
        } else if let Some(slot) = self
            .new_entities
            .iter_mut()
            .find(|e| (e.kind, e.id) == key)
        {
            *slot = entity;
        }
    }

    /// Register an update-type write of a property holder
    ///
    /// A write to an entity already registered as new stays in "new": an
    /// entity never appears in both sets for the same transaction.
    pub fn register_modified(&mut self, entity: Entity) {
        let key = (entity.kind, entity.id);
        if self.new_keys.contains(&key) {
            if let Some(slot) = self
                .new_entities
                .iter_mut()
                .find(|e| (e.kind, e.id) == key)
            {
                *slot = entity;
            }
            return;
        }
        if self.modified_keys.insert(key) {
            self.modified_entities.push(entity);
        } else if let Some(slot) = self
            .modified_entities
            .iter_mut()
            .find(|e| (e.kind, e.id) == key)
        {
            *slot = entity;
        }
    }

    /// Number of entities registered as new
    pub fn new_count(&self) -> usize {
        self.new_entities.len()
    }

    /// Number of entities registered as modified
    pub fn modified_count(&self) -> usize {
        self.modified_entities.len()
    }

    /// Number of entities validated so far
    pub fn validated_count(&self) -> usize {
        self.validated.len()
    }

    /// Whether the given entity was validated in this transaction
    pub fn is_validated(&self, kind: EntityKind, id: EntityId) -> bool {
        self.validated.contains(&(kind, id))
    }

    /// Mark an entity validated; returns false if it already was
    fn mark_validated(&mut self, key: EntityKey) -> bool {
        self.validated.insert(key)
    }

    /// Enqueue a script-requested target unless already validated or pending
    fn request(&mut self, entity: Entity) {
        let key = (entity.kind, entity.id);
        if self.validated.contains(&key)
            || self.new_keys.contains(&key)
            || self.modified_keys.contains(&key)
        {
            return;
        }
        self.queue.push_back(QueuedValidation {
            entity,
            is_new: false,
        });
    }

    /// Move every modified-but-unvalidated entity into the queue
    fn enqueue_unvalidated_modified(&mut self) {
        let modified = std::mem::take(&mut self.modified_entities);
        for entity in modified {
            let key = (entity.kind, entity.id);
            if !self.validated.contains(&key) {
                self.queue.push_back(QueuedValidation {
                    entity,
                    is_new: false,
                });
            }
        }
    }
}

impl Default for PendingValidationSet {
    fn default() -> Self {
        PendingValidationSet::new()
    }
}

/// Observer orchestrating pre-commit script validation
///
/// Registers property-holder writes into the pending set and drives the
/// `Idle → ValidatingNew → ValidatingQueued → Done` pass at `before_commit`.
/// The first failure is returned as `Error::Validation` naming the entity
/// and the script's message; the manager rolls the transaction back with it.
pub struct EntityValidationCoordinator {
    engine: Arc<dyn ValidationEngine>,
}

impl EntityValidationCoordinator {
    /// Create the coordinator over a validation engine
    pub fn new(engine: Arc<dyn ValidationEngine>) -> Self {
        EntityValidationCoordinator { engine }
    }

    /// Validate one entity, at most once per transaction
    ///
    /// Marks the entity validated first, then evaluates its script (if any)
    /// and enqueues any re-validation requests the script issued.
    fn validate_one(&self, ctx: &mut TransactionContext, entity: Entity, is_new: bool) -> Result<()> {
        let key = (entity.kind, entity.id);
        if !ctx.pending.mark_validated(key) {
            return Ok(());
        }

        let Some(script) = entity.validation_script().cloned() else {
            // No script on the type: no-op success
            return Ok(());
        };

        let mut requests = ValidationRequests::new();
        let verdict = self
            .engine
            .evaluate(&script, &entity, is_new, &mut requests);

        match verdict {
            Ok(None) => {
                for requested in requests.drain() {
                    ctx.pending.request(requested);
                }
                Ok(())
            }
            Ok(Some(message)) => {
                warn!(
                    target: "limsdb::validation",
                    entity = %entity.entity_ref(),
                    script = %script.name,
                    %message,
                    "Validation script rejected entity"
                );
                Err(Error::validation(entity.entity_ref().to_string(), message))
            }
            Err(fault) => {
                // An engine fault aborts exactly like a rejection; the raw
                // error is only logged.
                warn!(
                    target: "limsdb::validation",
                    entity = %entity.entity_ref(),
                    script = %script.name,
                    error = %fault,
                    "Validation script failed to execute"
                );
                Err(Error::validation(
                    entity.entity_ref().to_string(),
                    fault.to_string(),
                ))
            }
        }
    }
}

impl EntityObserver for EntityValidationCoordinator {
    fn name(&self) -> &'static str {
        "entity-validation"
    }

    fn on_insert(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.has_properties() {
            ctx.pending.register_new(entity.clone());
        }
        false
    }

    fn on_update(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.has_properties() {
            ctx.pending.register_modified(entity.clone());
        }
        false
    }

    fn before_commit(&self, ctx: &mut TransactionContext) -> Result<()> {
        ctx.pending.phase = ValidationPhase::ValidatingNew;
        debug!(
            target: "limsdb::validation",
            txn_id = ctx.txn_id,
            new = ctx.pending.new_count(),
            modified = ctx.pending.modified_count(),
            "Validation pass started"
        );

        let new_entities = ctx.pending.new_entities.clone();
        for entity in new_entities {
            if let Err(failure) = self.validate_one(ctx, entity, true) {
                ctx.pending.phase = ValidationPhase::Done;
                return Err(failure);
            }
        }

        ctx.pending.enqueue_unvalidated_modified();
        ctx.pending.phase = ValidationPhase::ValidatingQueued;

        while let Some(queued) = ctx.pending.queue.pop_front() {
            if let Err(failure) = self.validate_one(ctx, queued.entity, queued.is_new) {
                ctx.pending.phase = ValidationPhase::Done;
                return Err(failure);
            }
        }

        ctx.pending.phase = ValidationPhase::Done;
        debug!(
            target: "limsdb::validation",
            txn_id = ctx.txn_id,
            validated = ctx.pending.validated_count(),
            "Validation pass complete"
        );
        Ok(())
    }
}

//! Database composition root
//!
//! Wires the entity store, the work backlogs, the session registry, the
//! sample lock, and the script registry into a transaction manager with the
//! observer pipeline in its one fixed order:
//!
//! 1. entity validation coordinator
//! 2. dynamic-property scheduler
//! 3. full-text index scheduler
//! 4. session invalidation
//! 5. sample lock
//!
//! Completion hooks run in the same order, which puts the queue drains
//! before the session broadcast and the lock release last, so no waiter can
//! observe a half-completed transaction.

use crate::script::ScriptRegistry;
use crate::sessions::SessionRegistry;
use limsdb_concurrency::{
    DynamicPropertyScheduler, EntityObserver, EntityValidationCoordinator, FullTextIndexScheduler,
    SampleLock, SampleLockObserver, SessionInvalidationObserver, TransactionContext,
    TransactionManager, TransactionMetrics,
};
use limsdb_core::{Entity, EntityId, EntityKind, EntityRef, Result};
use limsdb_storage::{EntityStore, InMemoryEvaluationBacklog, InMemoryIndexBacklog};
use std::sync::Arc;
use tracing::info;

/// The assembled persistence core
///
/// Create one per store with [`Database::new`], register validation scripts,
/// then run transactions either through the closure API ([`Database::transaction`],
/// commit on `Ok`, rollback on `Err`) or manually via [`Database::begin`] and
/// [`Database::commit`] / [`Database::rollback`].
pub struct Database {
    manager: TransactionManager,
    store: Arc<EntityStore>,
    scripts: Arc<ScriptRegistry>,
    sessions: Arc<SessionRegistry>,
    property_backlog: Arc<InMemoryEvaluationBacklog>,
    index_backlog: Arc<InMemoryIndexBacklog>,
    sample_lock: Arc<SampleLock>,
}

impl Database {
    /// Assemble a fresh database with the standard observer pipeline
    pub fn new() -> Self {
        let store = Arc::new(EntityStore::new());
        let scripts = Arc::new(ScriptRegistry::new());
        let sessions = Arc::new(SessionRegistry::new());
        let property_backlog = Arc::new(InMemoryEvaluationBacklog::new());
        let index_backlog = Arc::new(InMemoryIndexBacklog::new());
        let sample_lock = Arc::new(SampleLock::new());

        let observers: Vec<Arc<dyn EntityObserver>> = vec![
            Arc::new(EntityValidationCoordinator::new(scripts.clone())),
            Arc::new(DynamicPropertyScheduler::new(property_backlog.clone())),
            Arc::new(FullTextIndexScheduler::new(index_backlog.clone())),
            Arc::new(SessionInvalidationObserver::new(sessions.clone())),
            Arc::new(SampleLockObserver::new(sample_lock.clone())),
        ];

        info!(target: "limsdb::engine", "Database assembled");
        Database {
            manager: TransactionManager::new(store.clone(), observers),
            store,
            scripts,
            sessions,
            property_backlog,
            index_backlog,
            sample_lock,
        }
    }

    // === Transactions ===

    /// Open a transaction
    pub fn begin(&self) -> TransactionContext {
        self.manager.begin()
    }

    /// Register an insert in the given transaction
    pub fn insert(&self, ctx: &mut TransactionContext, entity: Entity) -> Result<()> {
        self.manager.insert(ctx, entity)
    }

    /// Register an update in the given transaction
    pub fn update(&self, ctx: &mut TransactionContext, entity: Entity) -> Result<()> {
        self.manager.update(ctx, entity)
    }

    /// Register a delete in the given transaction
    pub fn delete(&self, ctx: &mut TransactionContext, entity_ref: EntityRef) -> Result<()> {
        self.manager.delete(ctx, entity_ref)
    }

    /// Commit the transaction; validation failures roll it back and surface
    /// as the returned error
    pub fn commit(&self, ctx: &mut TransactionContext) -> Result<()> {
        self.manager.commit(ctx)
    }

    /// Roll the transaction back
    pub fn rollback(&self, ctx: &mut TransactionContext, reason: impl Into<String>) -> Result<()> {
        self.manager.rollback(ctx, reason)
    }

    /// Run a closure inside a transaction
    ///
    /// Commits when the closure returns `Ok`, rolls back when it returns
    /// `Err`. The commit's own failure (a validation rejection, typically)
    /// is returned as-is.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&TransactionManager, &mut TransactionContext) -> Result<T>,
    ) -> Result<T> {
        let mut ctx = self.manager.begin();
        match f(&self.manager, &mut ctx) {
            Ok(value) => {
                self.manager.commit(&mut ctx)?;
                Ok(value)
            }
            Err(e) => {
                self.manager.rollback(&mut ctx, e.to_string())?;
                Err(e)
            }
        }
    }

    // === Reads ===

    /// Fetch a committed entity
    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<Entity> {
        self.store.get(kind, id)
    }

    /// Number of committed entities
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    // === Component access ===

    /// The validation script registry
    pub fn scripts(&self) -> &Arc<ScriptRegistry> {
        &self.scripts
    }

    /// The live session registry
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The dynamic-property work backlog
    pub fn property_backlog(&self) -> &Arc<InMemoryEvaluationBacklog> {
        &self.property_backlog
    }

    /// The full-text index work backlog
    pub fn index_backlog(&self) -> &Arc<InMemoryIndexBacklog> {
        &self.index_backlog
    }

    /// The store-wide sample write gate
    pub fn sample_lock(&self) -> &Arc<SampleLock> {
        &self.sample_lock
    }

    /// Transaction lifecycle counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.manager.metrics()
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::new()
    }
}

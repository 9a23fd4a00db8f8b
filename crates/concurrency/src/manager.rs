//! Transaction manager
//!
//! Owns the commit/rollback lifecycle and invokes the observer hooks at the
//! correct points, in one fixed declared order:
//!
//! 1. write notifications (`on_insert`/`on_update`/`on_delete`), fired
//!    synchronously as each write is registered
//! 2. `before_commit`, at the pre-commit point — the first error rolls the
//!    transaction back with that error as the reason, surfaced to the caller
//!    as the user-facing failure rather than a generic transaction error
//! 3. write-set flush into the store
//! 4. `after_completion`, strictly after the outcome is final: queue drains,
//!    session broadcast, and the sample-lock release (declared last)
//!
//! Exactly one `after_completion` pass runs per transaction.

use crate::observer::EntityObserver;
use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::{Entity, EntityRef, Result};
use limsdb_storage::EntityStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates transactions over the entity store and the observer list
pub struct TransactionManager {
    store: Arc<EntityStore>,
    observers: Vec<Arc<dyn EntityObserver>>,
    next_txn_id: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_rolled_back: AtomicU64,
}

impl TransactionManager {
    /// Create a manager over a store and an ordered observer list
    ///
    /// The declared order is the invocation order for every hook pass.
    pub fn new(store: Arc<EntityStore>, observers: Vec<Arc<dyn EntityObserver>>) -> Self {
        TransactionManager {
            store,
            observers,
            next_txn_id: AtomicU64::new(1),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_rolled_back: AtomicU64::new(0),
        }
    }

    /// The store this manager flushes committed write sets into
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Open a transaction
    pub fn begin(&self) -> TransactionContext {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "limsdb::txn", txn_id, "Transaction started");
        TransactionContext::new(txn_id)
    }

    /// Register an insert-type write
    ///
    /// Observers are notified synchronously in declared order; the write is
    /// then buffered on the context, to be applied only if the transaction
    /// commits.
    pub fn insert(&self, ctx: &mut TransactionContext, entity: Entity) -> Result<()> {
        ctx.ensure_active()?;
        for observer in &self.observers {
            observer.on_insert(ctx, &entity);
        }
        ctx.buffer_insert(entity);
        Ok(())
    }

    /// Register an update-type write
    pub fn update(&self, ctx: &mut TransactionContext, entity: Entity) -> Result<()> {
        ctx.ensure_active()?;
        for observer in &self.observers {
            observer.on_update(ctx, &entity);
        }
        ctx.buffer_update(entity);
        Ok(())
    }

    /// Register a delete
    pub fn delete(&self, ctx: &mut TransactionContext, entity_ref: EntityRef) -> Result<()> {
        ctx.ensure_active()?;
        for observer in &self.observers {
            observer.on_delete(ctx, &entity_ref);
        }
        ctx.buffer_delete(entity_ref);
        Ok(())
    }

    /// Commit the transaction
    ///
    /// Runs the pre-commit pass, flushes the write set, then the completion
    /// pass. On a validation failure the transaction is rolled back and the
    /// validation error itself is returned; the write set is never partially
    /// applied.
    pub fn commit(&self, ctx: &mut TransactionContext) -> Result<()> {
        ctx.mark_validating()?;

        for observer in &self.observers {
            if let Err(failure) = observer.before_commit(ctx) {
                warn!(
                    target: "limsdb::txn",
                    txn_id = ctx.txn_id,
                    observer = observer.name(),
                    reason = %failure,
                    "Pre-commit hook aborted transaction"
                );
                self.finish(ctx, TransactionOutcome::RolledBack, failure.to_string())?;
                return Err(failure);
            }
        }

        if let Err(store_failure) = self.store.apply(
            &ctx.write_set.inserts,
            &ctx.write_set.updates,
            &ctx.write_set.deletes,
        ) {
            warn!(
                target: "limsdb::txn",
                txn_id = ctx.txn_id,
                error = %store_failure,
                "Write-set flush failed"
            );
            self.finish(ctx, TransactionOutcome::RolledBack, store_failure.to_string())?;
            return Err(store_failure);
        }

        ctx.mark_committed()?;
        self.total_committed.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "limsdb::txn",
            txn_id = ctx.txn_id,
            writes = ctx.write_set.len(),
            "Transaction committed"
        );

        for observer in &self.observers {
            observer.after_completion(ctx, TransactionOutcome::Committed);
        }
        Ok(())
    }

    /// Roll the transaction back at the caller's request
    pub fn rollback(&self, ctx: &mut TransactionContext, reason: impl Into<String>) -> Result<()> {
        ctx.ensure_active()?;
        self.finish(ctx, TransactionOutcome::RolledBack, reason.into())
    }

    /// Mark the context aborted and run the completion pass
    fn finish(
        &self,
        ctx: &mut TransactionContext,
        outcome: TransactionOutcome,
        reason: String,
    ) -> Result<()> {
        ctx.mark_aborted(reason)?;
        self.total_rolled_back.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "limsdb::txn",
            txn_id = ctx.txn_id,
            reason = ctx.abort_reason().unwrap_or(""),
            "Transaction rolled back"
        );
        for observer in &self.observers {
            observer.after_completion(ctx, outcome);
        }
        Ok(())
    }

    /// Lifecycle counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            total_started: self.total_started.load(Ordering::Relaxed),
            total_committed: self.total_committed.load(Ordering::Relaxed),
            total_rolled_back: self.total_rolled_back.load(Ordering::Relaxed),
        }
    }
}

/// Transaction lifecycle counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Transactions opened
    pub total_started: u64,
    /// Transactions committed
    pub total_committed: u64,
    /// Transactions rolled back (validation failures and caller requests)
    pub total_rolled_back: u64,
}

impl TransactionMetrics {
    /// Transactions that reached a terminal state
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_rolled_back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsdb_core::{EntityId, EntityKind, EntityType, Error};
    use parking_lot::Mutex;

    fn sample(id: u64) -> Entity {
        Entity::new(
            EntityId::new(id),
            EntityKind::Sample,
            EntityType::new("BACTERIA"),
        )
    }

    /// Observer double recording hook invocations
    #[derive(Default)]
    struct Probe {
        events: Mutex<Vec<String>>,
        veto: Option<String>,
    }

    impl Probe {
        fn vetoing(message: &str) -> Self {
            Probe {
                events: Mutex::new(Vec::new()),
                veto: Some(message.to_string()),
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl EntityObserver for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn on_insert(&self, _ctx: &mut TransactionContext, entity: &Entity) -> bool {
            self.events.lock().push(format!("insert:{}", entity.id));
            false
        }

        fn before_commit(&self, _ctx: &mut TransactionContext) -> Result<()> {
            self.events.lock().push("before_commit".to_string());
            match &self.veto {
                Some(message) => Err(Error::validation("Probe", message.clone())),
                None => Ok(()),
            }
        }

        fn after_completion(&self, _ctx: &mut TransactionContext, outcome: TransactionOutcome) {
            self.events.lock().push(format!("completed:{:?}", outcome));
        }
    }

    #[test]
    fn test_commit_applies_writes_and_runs_hooks_in_order() {
        let store = Arc::new(EntityStore::new());
        let probe = Arc::new(Probe::default());
        let manager = TransactionManager::new(store.clone(), vec![probe.clone()]);

        let mut ctx = manager.begin();
        manager.insert(&mut ctx, sample(1)).unwrap();
        manager.commit(&mut ctx).unwrap();

        assert!(ctx.is_committed());
        assert!(store.contains(EntityKind::Sample, EntityId::new(1)));
        assert_eq!(
            probe.events(),
            vec!["insert:1", "before_commit", "completed:Committed"]
        );
    }

    #[test]
    fn test_veto_rolls_back_and_surfaces_reason() {
        let store = Arc::new(EntityStore::new());
        let probe = Arc::new(Probe::vetoing("not allowed"));
        let manager = TransactionManager::new(store.clone(), vec![probe.clone()]);

        let mut ctx = manager.begin();
        manager.insert(&mut ctx, sample(1)).unwrap();
        let err = manager.commit(&mut ctx).unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("not allowed"));
        assert!(ctx.is_aborted());
        assert!(!store.contains(EntityKind::Sample, EntityId::new(1)));
        assert_eq!(
            probe.events(),
            vec!["insert:1", "before_commit", "completed:RolledBack"]
        );
    }

    #[test]
    fn test_explicit_rollback_runs_completion_pass() {
        let store = Arc::new(EntityStore::new());
        let probe = Arc::new(Probe::default());
        let manager = TransactionManager::new(store.clone(), vec![probe.clone()]);

        let mut ctx = manager.begin();
        manager.insert(&mut ctx, sample(1)).unwrap();
        manager.rollback(&mut ctx, "caller changed its mind").unwrap();

        assert!(ctx.is_aborted());
        assert_eq!(ctx.abort_reason(), Some("caller changed its mind"));
        assert!(store.is_empty());
        assert_eq!(
            probe.events(),
            vec!["insert:1", "completed:RolledBack"]
        );
    }

    #[test]
    fn test_operations_rejected_after_completion() {
        let store = Arc::new(EntityStore::new());
        let manager = TransactionManager::new(store, vec![]);

        let mut ctx = manager.begin();
        manager.commit(&mut ctx).unwrap();

        assert!(manager.insert(&mut ctx, sample(1)).is_err());
        assert!(manager.commit(&mut ctx).is_err());
        assert!(manager.rollback(&mut ctx, "late").is_err());
    }

    #[test]
    fn test_store_flush_failure_rolls_back() {
        let store = Arc::new(EntityStore::new());
        store.apply(&[sample(1)], &[], &[]).unwrap();
        let manager = TransactionManager::new(store.clone(), vec![]);

        // Insert colliding with an existing record
        let mut ctx = manager.begin();
        manager.insert(&mut ctx, sample(1)).unwrap();
        let err = manager.commit(&mut ctx).unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(ctx.is_aborted());
    }

    #[test]
    fn test_metrics_track_outcomes() {
        let store = Arc::new(EntityStore::new());
        let manager = TransactionManager::new(store, vec![]);

        let mut a = manager.begin();
        manager.commit(&mut a).unwrap();
        let mut b = manager.begin();
        manager.rollback(&mut b, "no").unwrap();

        let metrics = manager.metrics();
        assert_eq!(metrics.total_started, 2);
        assert_eq!(metrics.total_committed, 1);
        assert_eq!(metrics.total_rolled_back, 1);
        assert_eq!(metrics.total_completed(), 2);
    }

    #[test]
    fn test_txn_ids_are_unique() {
        let store = Arc::new(EntityStore::new());
        let manager = TransactionManager::new(store, vec![]);
        let a = manager.begin();
        let b = manager.begin();
        assert_ne!(a.txn_id, b.txn_id);
    }
}

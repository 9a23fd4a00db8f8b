//! Transaction context
//!
//! Per-transaction state threaded explicitly through every hook: the
//! buffered write set, the pending-validation bookkeeping, the commit-gated
//! work queues, the authorization dirty flag, and the sample-lock hold.
//! Nothing in here is ever shared across transactions.
//!
//! Writes are buffered and applied to the store only after pre-commit
//! validation has passed; a rollback simply discards the buffer, so partial
//! application is impossible.

use crate::sample_lock::{SampleLock, SampleLockHold};
use crate::validation::PendingValidationSet;
use limsdb_core::{
    Entity, EntityRef, Error, IndexUpdateRequest, Result, ScheduledEvaluation,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (commit requested)
/// - `Validating` → `Committed` (validation passed, writes applied)
/// - `Validating` → `Aborted` (validation failure)
/// - `Active` → `Aborted` (caller rollback)
///
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, accepts writes
    Active,
    /// Pre-commit validation pass is running
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was rolled back
    Aborted {
        /// Human-readable reason for the rollback
        reason: String,
    },
}

/// Final outcome delivered to completion hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// The transaction committed; commit-gated work may run
    Committed,
    /// The transaction rolled back; commit-gated work is discarded
    RolledBack,
}

/// Buffered writes of one transaction, in registration order
#[derive(Debug, Default)]
pub struct WriteSet {
    /// Entities created in this transaction
    pub inserts: Vec<Entity>,
    /// Entities modified in this transaction
    pub updates: Vec<Entity>,
    /// Entities deleted in this transaction
    pub deletes: Vec<EntityRef>,
}

impl WriteSet {
    /// Total buffered operations
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        self.inserts.clear();
        self.updates.clear();
        self.deletes.clear();
    }
}

/// Per-transaction state container
pub struct TransactionContext {
    /// Unique transaction id
    pub txn_id: u64,
    /// Current lifecycle status
    pub status: TransactionStatus,
    /// Buffered writes, applied at commit
    pub write_set: WriteSet,
    /// Validation bookkeeping (new/modified/validated/queued)
    pub pending: PendingValidationSet,
    /// Set when an authorization-relevant entity was written or deleted
    pub auth_dirty: bool,
    /// Dynamic-property recomputation requests, commit-gated
    pub property_queue: Vec<ScheduledEvaluation>,
    /// Full-text index update requests, commit-gated
    pub index_queue: Vec<IndexUpdateRequest>,
    sample_lock_hold: Option<SampleLockHold>,
    start_time: Instant,
}

impl TransactionContext {
    /// Create a fresh active context
    pub fn new(txn_id: u64) -> Self {
        TransactionContext {
            txn_id,
            status: TransactionStatus::Active,
            write_set: WriteSet::default(),
            pending: PendingValidationSet::new(),
            auth_dirty: false,
            property_queue: Vec::new(),
            index_queue: Vec::new(),
            sample_lock_hold: None,
            start_time: Instant::now(),
        }
    }

    // === State management ===

    /// Whether the transaction accepts new operations
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Whether the transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Whether the transaction rolled back
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Rollback reason, if rolled back
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    /// Error unless the transaction is active
    ///
    /// An aborted transaction reports the rollback reason so the caller
    /// learns why its earlier operations were discarded.
    pub fn ensure_active(&self) -> Result<()> {
        match &self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Aborted { reason } => Err(Error::TransactionAborted {
                reason: reason.clone(),
            }),
            other => Err(Error::invalid_state(format!(
                "transaction {} is not active: {:?}",
                self.txn_id, other
            ))),
        }
    }

    /// `Active` → `Validating`
    pub fn mark_validating(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Validating;
        Ok(())
    }

    /// `Validating` → `Committed`
    pub fn mark_committed(&mut self) -> Result<()> {
        match self.status {
            TransactionStatus::Validating => {
                self.status = TransactionStatus::Committed;
                Ok(())
            }
            _ => Err(Error::invalid_state(format!(
                "cannot commit transaction {} from {:?}",
                self.txn_id, self.status
            ))),
        }
    }

    /// Abort from `Active` or `Validating`; discards all buffered writes
    pub fn mark_aborted(&mut self, reason: String) -> Result<()> {
        match self.status {
            TransactionStatus::Committed => Err(Error::invalid_state(format!(
                "cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(Error::invalid_state(format!(
                "transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted { reason };
                self.write_set.clear();
                Ok(())
            }
        }
    }

    // === Write buffering (called by the manager after hook notification) ===

    /// Buffer an insert-type write
    pub fn buffer_insert(&mut self, entity: Entity) {
        self.write_set.inserts.push(entity);
    }

    /// Buffer an update-type write
    pub fn buffer_update(&mut self, entity: Entity) {
        self.write_set.updates.push(entity);
    }

    /// Buffer a delete
    pub fn buffer_delete(&mut self, entity_ref: EntityRef) {
        self.write_set.deletes.push(entity_ref);
    }

    // === Scheduled work ===

    /// Schedule dynamic-property recomputation; applied only on commit
    ///
    /// Non-blocking; duplicates are tolerated (recomputation is idempotent).
    pub fn schedule_evaluation(&mut self, request: ScheduledEvaluation) -> Result<()> {
        self.ensure_active()?;
        self.property_queue.push(request);
        Ok(())
    }

    /// Schedule a full-text index update; applied only on commit
    pub fn schedule_index_update(&mut self, request: IndexUpdateRequest) -> Result<()> {
        if self.is_committed() || self.is_aborted() {
            return Err(Error::invalid_state(format!(
                "transaction {} is complete",
                self.txn_id
            )));
        }
        self.index_queue.push(request);
        Ok(())
    }

    // === Sample lock ===

    /// Take one more hold on the sample gate (blocks if another thread owns it)
    pub fn acquire_sample_lock(&mut self, lock: &Arc<SampleLock>) {
        let hold = self
            .sample_lock_hold
            .get_or_insert_with(|| SampleLockHold::new(Arc::clone(lock)));
        hold.acquire();
    }

    /// Release every hold this transaction took; no-op if none
    pub fn release_sample_lock(&mut self) {
        self.sample_lock_hold = None;
    }

    /// Holds currently taken on the sample gate
    pub fn sample_lock_holds(&self) -> usize {
        self.sample_lock_hold.as_ref().map_or(0, |h| h.count())
    }

    /// Elapsed time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsdb_core::{EntityId, EntityKind, EntityType};

    fn sample(id: u64) -> Entity {
        Entity::new(
            EntityId::new(id),
            EntityKind::Sample,
            EntityType::new("BACTERIA"),
        )
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut ctx = TransactionContext::new(1);
        assert!(ctx.is_active());
        ctx.mark_validating().unwrap();
        ctx.mark_committed().unwrap();
        assert!(ctx.is_committed());
    }

    #[test]
    fn test_cannot_commit_from_active() {
        let mut ctx = TransactionContext::new(1);
        assert!(ctx.mark_committed().is_err());
    }

    #[test]
    fn test_abort_clears_write_set() {
        let mut ctx = TransactionContext::new(1);
        ctx.buffer_insert(sample(1));
        ctx.buffer_update(sample(2));
        assert_eq!(ctx.write_set.len(), 2);

        ctx.mark_aborted("test".to_string()).unwrap();
        assert!(ctx.write_set.is_empty());
        assert_eq!(ctx.abort_reason(), Some("test"));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut ctx = TransactionContext::new(1);
        ctx.mark_aborted("gone".to_string()).unwrap();
        assert!(ctx.mark_validating().is_err());
        assert!(ctx.mark_aborted("again".to_string()).is_err());

        let mut ctx = TransactionContext::new(2);
        ctx.mark_validating().unwrap();
        ctx.mark_committed().unwrap();
        assert!(ctx.mark_aborted("late".to_string()).is_err());
    }

    #[test]
    fn test_schedule_requires_active() {
        let mut ctx = TransactionContext::new(1);
        ctx.mark_aborted("done".to_string()).unwrap();
        let err = ctx
            .schedule_evaluation(ScheduledEvaluation::for_ids(
                EntityKind::Sample,
                vec![EntityId::new(1)],
            ))
            .unwrap_err();
        // Aborted transactions report why they died
        assert!(matches!(err, Error::TransactionAborted { .. }));
        assert!(err.to_string().contains("done"));

        let mut ctx = TransactionContext::new(2);
        ctx.mark_validating().unwrap();
        ctx.mark_committed().unwrap();
        let err = ctx
            .schedule_evaluation(ScheduledEvaluation::for_ids(
                EntityKind::Sample,
                vec![EntityId::new(1)],
            ))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_sample_lock_hold_round_trip() {
        let lock = Arc::new(SampleLock::new());
        let mut ctx = TransactionContext::new(1);
        assert_eq!(ctx.sample_lock_holds(), 0);

        ctx.acquire_sample_lock(&lock);
        ctx.acquire_sample_lock(&lock);
        assert_eq!(ctx.sample_lock_holds(), 2);
        assert!(lock.is_locked());

        ctx.release_sample_lock();
        assert_eq!(ctx.sample_lock_holds(), 0);
        assert!(!lock.is_locked());
    }
}

//! Full-text index scheduling
//!
//! Inserted and updated property holders are queued for re-indexing at
//! write-notification time; arbitrary write paths may queue more through the
//! context. Same commit gate as the dynamic-property queue: persisted to the
//! durable backlog only on commit, discarded on rollback, and a persist
//! failure never un-commits.

use crate::observer::EntityObserver;
use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::{Entity, IndexBacklog, IndexUpdateRequest};
use std::sync::Arc;
use tracing::{debug, error};

/// Observer queueing and draining full-text index updates
pub struct FullTextIndexScheduler {
    backlog: Arc<dyn IndexBacklog>,
}

impl FullTextIndexScheduler {
    /// Create the scheduler over a durable backlog
    pub fn new(backlog: Arc<dyn IndexBacklog>) -> Self {
        FullTextIndexScheduler { backlog }
    }

    fn queue_for(&self, ctx: &mut TransactionContext, entity: &Entity) {
        if entity.kind.has_properties() {
            ctx.index_queue
                .push(IndexUpdateRequest::new(entity.kind, vec![entity.id]));
        }
    }
}

impl EntityObserver for FullTextIndexScheduler {
    fn name(&self) -> &'static str {
        "fulltext-index"
    }

    fn on_insert(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        self.queue_for(ctx, entity);
        false
    }

    fn on_update(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        self.queue_for(ctx, entity);
        false
    }

    fn after_completion(&self, ctx: &mut TransactionContext, outcome: TransactionOutcome) {
        let queued = std::mem::take(&mut ctx.index_queue);
        if queued.is_empty() {
            return;
        }
        match outcome {
            TransactionOutcome::Committed => {
                debug!(
                    target: "limsdb::txn",
                    txn_id = ctx.txn_id,
                    requests = queued.len(),
                    "Persisting index update queue"
                );
                if let Err(e) = self.backlog.persist(queued) {
                    error!(
                        target: "limsdb::txn",
                        txn_id = ctx.txn_id,
                        error = %e,
                        "Index backlog persist failed after commit"
                    );
                }
            }
            TransactionOutcome::RolledBack => {
                debug!(
                    target: "limsdb::txn",
                    txn_id = ctx.txn_id,
                    discarded = queued.len(),
                    "Discarding index update queue after rollback"
                );
            }
        }
    }
}

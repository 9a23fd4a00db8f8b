//! Dynamic-property scheduling
//!
//! Write paths accumulate "recompute dynamic properties" requests on the
//! transaction context; this observer moves them into the durable backlog
//! when the transaction commits and discards them when it rolls back.
//! Exactly one of the two happens per transaction, decided solely by the
//! outcome. A persist failure is logged and swallowed: post-commit work can
//! never un-commit an already-committed transaction.

use crate::observer::EntityObserver;
use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::EvaluationBacklog;
use std::sync::Arc;
use tracing::{debug, error};

/// Observer draining the context's dynamic-property queue at completion
pub struct DynamicPropertyScheduler {
    backlog: Arc<dyn EvaluationBacklog>,
}

impl DynamicPropertyScheduler {
    /// Create the scheduler over a durable backlog
    pub fn new(backlog: Arc<dyn EvaluationBacklog>) -> Self {
        DynamicPropertyScheduler { backlog }
    }
}

impl EntityObserver for DynamicPropertyScheduler {
    fn name(&self) -> &'static str {
        "dynamic-properties"
    }

    fn after_completion(&self, ctx: &mut TransactionContext, outcome: TransactionOutcome) {
        let queued = std::mem::take(&mut ctx.property_queue);
        if queued.is_empty() {
            return;
        }
        match outcome {
            TransactionOutcome::Committed => {
                debug!(
                    target: "limsdb::txn",
                    txn_id = ctx.txn_id,
                    requests = queued.len(),
                    "Persisting dynamic-property queue"
                );
                if let Err(e) = self.backlog.persist(queued) {
                    error!(
                        target: "limsdb::txn",
                        txn_id = ctx.txn_id,
                        error = %e,
                        "Dynamic-property backlog persist failed after commit"
                    );
                }
            }
            TransactionOutcome::RolledBack => {
                debug!(
                    target: "limsdb::txn",
                    txn_id = ctx.txn_id,
                    discarded = queued.len(),
                    "Discarding dynamic-property queue after rollback"
                );
            }
        }
    }
}

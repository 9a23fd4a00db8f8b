//! Collaborator traits
//!
//! Seams between the interceptor core and its external collaborators: the
//! validation engine that executes user scripts, the durable work backlogs
//! consumed asynchronously elsewhere, and the session manager that holds
//! live user sessions.

use crate::entity::{Entity, ValidationScript};
use crate::error::Result;
use crate::schedule::{IndexUpdateRequest, ScheduledEvaluation};

/// Re-validation requests collected while a script runs
///
/// A validation script may ask for validation of an arbitrary other entity
/// whose acceptability its own mutation may have changed. The request is
/// passed by message, carrying the full entity, so the coordinator never
/// reads back through the store mid-validation. Requests are drained by the
/// coordinator after each evaluation; a target already validated (or already
/// pending) in the same transaction is silently skipped.
#[derive(Debug, Default)]
pub struct ValidationRequests {
    requested: Vec<Entity>,
}

impl ValidationRequests {
    /// Create an empty request collector
    pub fn new() -> Self {
        ValidationRequests::default()
    }

    /// Ask for validation of another entity in the same transaction
    pub fn request_validation(&mut self, entity: Entity) {
        self.requested.push(entity);
    }

    /// Number of outstanding requests
    pub fn len(&self) -> usize {
        self.requested.len()
    }

    /// Whether no requests are outstanding
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    /// Take all outstanding requests, leaving the collector empty
    pub fn drain(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.requested)
    }
}

/// Executes user-authored validation scripts against entities
///
/// # Contract
///
/// - `Ok(None)`: the entity is valid.
/// - `Ok(Some(message))`: the script rejected the entity.
/// - `Err(_)`: the script itself failed to execute. Callers treat this
///   identically to a rejection for rollback purposes; the raw error is
///   additionally logged for diagnostics.
///
/// `is_new` distinguishes a newly created entity from a modified one.
/// The script may enqueue re-validation of other entities via `requests`.
pub trait ValidationEngine: Send + Sync {
    /// Evaluate `script` against `entity`
    fn evaluate(
        &self,
        script: &ValidationScript,
        entity: &Entity,
        is_new: bool,
        requests: &mut ValidationRequests,
    ) -> Result<Option<String>>;
}

/// Durable backlog of dynamic-property recomputation work
///
/// Consumed asynchronously outside this core. `persist` is invoked exactly
/// once per committed transaction that scheduled anything; it is never
/// invoked for rolled-back transactions.
pub trait EvaluationBacklog: Send + Sync {
    /// Move a transaction's scheduled recomputations into the backlog
    fn persist(&self, batch: Vec<ScheduledEvaluation>) -> Result<()>;
}

/// Durable backlog of full-text index update work
pub trait IndexBacklog: Send + Sync {
    /// Move a transaction's index update requests into the backlog
    fn persist(&self, batch: Vec<IndexUpdateRequest>) -> Result<()>;
}

/// Broadcast channel to all live user sessions
pub trait SessionBroadcaster: Send + Sync {
    /// Tell every live session to refresh its cached permissions
    fn refresh_all_sessions(&self);
}

//! In-memory work backlogs
//!
//! Durable-backlog stand-ins for dynamic-property recomputation and
//! full-text index updates. The real consumers run asynchronously outside
//! this core; these implementations just accumulate batches and let the
//! consumer (or a test) drain them.

use limsdb_core::{EvaluationBacklog, IndexBacklog, IndexUpdateRequest, Result, ScheduledEvaluation};
use parking_lot::Mutex;

/// Accumulating backlog of dynamic-property recomputation requests
#[derive(Debug, Default)]
pub struct InMemoryEvaluationBacklog {
    entries: Mutex<Vec<ScheduledEvaluation>>,
}

impl InMemoryEvaluationBacklog {
    /// Create an empty backlog
    pub fn new() -> Self {
        InMemoryEvaluationBacklog::default()
    }

    /// Number of persisted requests
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the backlog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Take everything, consumer-side
    pub fn drain(&self) -> Vec<ScheduledEvaluation> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Snapshot of the current contents
    pub fn snapshot(&self) -> Vec<ScheduledEvaluation> {
        self.entries.lock().clone()
    }
}

impl EvaluationBacklog for InMemoryEvaluationBacklog {
    fn persist(&self, batch: Vec<ScheduledEvaluation>) -> Result<()> {
        self.entries.lock().extend(batch);
        Ok(())
    }
}

/// Accumulating backlog of full-text index update requests
#[derive(Debug, Default)]
pub struct InMemoryIndexBacklog {
    entries: Mutex<Vec<IndexUpdateRequest>>,
}

impl InMemoryIndexBacklog {
    /// Create an empty backlog
    pub fn new() -> Self {
        InMemoryIndexBacklog::default()
    }

    /// Number of persisted requests
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the backlog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Take everything, consumer-side
    pub fn drain(&self) -> Vec<IndexUpdateRequest> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Snapshot of the current contents
    pub fn snapshot(&self) -> Vec<IndexUpdateRequest> {
        self.entries.lock().clone()
    }
}

impl IndexBacklog for InMemoryIndexBacklog {
    fn persist(&self, batch: Vec<IndexUpdateRequest>) -> Result<()> {
        self.entries.lock().extend(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsdb_core::{EntityId, EntityKind};

    #[test]
    fn test_evaluation_backlog_persist_and_drain() {
        let backlog = InMemoryEvaluationBacklog::new();
        assert!(backlog.is_empty());

        backlog
            .persist(vec![ScheduledEvaluation::for_ids(
                EntityKind::Sample,
                vec![EntityId::new(1)],
            )])
            .unwrap();
        backlog
            .persist(vec![ScheduledEvaluation::for_ids(
                EntityKind::DataSet,
                vec![EntityId::new(2)],
            )])
            .unwrap();
        assert_eq!(backlog.len(), 2);

        let drained = backlog.drain();
        assert_eq!(drained.len(), 2);
        assert!(backlog.is_empty());
    }

    #[test]
    fn test_index_backlog_persist_and_snapshot() {
        let backlog = InMemoryIndexBacklog::new();
        backlog
            .persist(vec![IndexUpdateRequest::new(
                EntityKind::Experiment,
                vec![EntityId::new(7)],
            )])
            .unwrap();

        let snap = backlog.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].ids, vec![EntityId::new(7)]);
        // Snapshot does not consume
        assert_eq!(backlog.len(), 1);
    }
}

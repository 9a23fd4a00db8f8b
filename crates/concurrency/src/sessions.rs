//! Session invalidation
//!
//! Authorization-relevant entities (role assignments, authorization groups,
//! spaces) feed cached permissions held by live user sessions. Any write or
//! delete touching one of those kinds sets a transaction-scoped dirty flag;
//! if the transaction commits with the flag set, every live session is told
//! to refresh, exactly once. A rollback broadcasts nothing. The flag dies
//! with the context either way.

use crate::observer::EntityObserver;
use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::{Entity, EntityRef, SessionBroadcaster};
use std::sync::Arc;
use tracing::info;

/// Observer broadcasting a permission refresh after relevant commits
pub struct SessionInvalidationObserver {
    broadcaster: Arc<dyn SessionBroadcaster>,
}

impl SessionInvalidationObserver {
    /// Create the observer over the session manager's broadcast channel
    pub fn new(broadcaster: Arc<dyn SessionBroadcaster>) -> Self {
        SessionInvalidationObserver { broadcaster }
    }
}

impl EntityObserver for SessionInvalidationObserver {
    fn name(&self) -> &'static str {
        "session-invalidation"
    }

    fn on_insert(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.is_authorization_relevant() {
            ctx.auth_dirty = true;
        }
        false
    }

    fn on_update(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.is_authorization_relevant() {
            ctx.auth_dirty = true;
        }
        false
    }

    fn on_delete(&self, ctx: &mut TransactionContext, entity_ref: &EntityRef) -> bool {
        if entity_ref.kind.is_authorization_relevant() {
            ctx.auth_dirty = true;
        }
        false
    }

    fn after_completion(&self, ctx: &mut TransactionContext, outcome: TransactionOutcome) {
        if ctx.auth_dirty && outcome == TransactionOutcome::Committed {
            info!(
                target: "limsdb::session",
                txn_id = ctx.txn_id,
                "Authorization-relevant commit; refreshing all sessions"
            );
            self.broadcaster.refresh_all_sessions();
        }
        ctx.auth_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsdb_core::{EntityId, EntityKind, EntityType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBroadcaster {
        broadcasts: AtomicUsize,
    }

    impl SessionBroadcaster for CountingBroadcaster {
        fn refresh_all_sessions(&self) {
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn group(id: u64) -> Entity {
        Entity::new(
            EntityId::new(id),
            EntityKind::AuthorizationGroup,
            EntityType::new("GROUP"),
        )
    }

    fn sample(id: u64) -> Entity {
        Entity::new(
            EntityId::new(id),
            EntityKind::Sample,
            EntityType::new("BACTERIA"),
        )
    }

    #[test]
    fn test_commit_with_auth_change_broadcasts_once() {
        let broadcaster = Arc::new(CountingBroadcaster::default());
        let observer = SessionInvalidationObserver::new(broadcaster.clone());
        let mut ctx = TransactionContext::new(1);

        // Several relevant writes still mean one broadcast
        observer.on_insert(&mut ctx, &group(1));
        observer.on_update(&mut ctx, &group(1));
        observer.on_delete(&mut ctx, &group(2).entity_ref());
        observer.after_completion(&mut ctx, TransactionOutcome::Committed);

        assert_eq!(broadcaster.broadcasts.load(Ordering::SeqCst), 1);
        assert!(!ctx.auth_dirty);
    }

    #[test]
    fn test_rollback_never_broadcasts() {
        let broadcaster = Arc::new(CountingBroadcaster::default());
        let observer = SessionInvalidationObserver::new(broadcaster.clone());
        let mut ctx = TransactionContext::new(1);

        observer.on_insert(&mut ctx, &group(1));
        observer.after_completion(&mut ctx, TransactionOutcome::RolledBack);

        assert_eq!(broadcaster.broadcasts.load(Ordering::SeqCst), 0);
        assert!(!ctx.auth_dirty);
    }

    #[test]
    fn test_irrelevant_writes_never_broadcast() {
        let broadcaster = Arc::new(CountingBroadcaster::default());
        let observer = SessionInvalidationObserver::new(broadcaster.clone());
        let mut ctx = TransactionContext::new(1);

        observer.on_insert(&mut ctx, &sample(1));
        observer.on_update(&mut ctx, &sample(1));
        observer.after_completion(&mut ctx, TransactionOutcome::Committed);

        assert_eq!(broadcaster.broadcasts.load(Ordering::SeqCst), 0);
    }
}

//! Entity write observers
//!
//! The persistence layer notifies an ordered list of observers synchronously
//! on each save/update/delete and at the commit boundary. Observers never
//! perform the write themselves; each defers its side effect into the
//! transaction context and reacts to the final outcome. The list replaces
//! the inheritance-stacked interceptor objects of a classic ORM with an
//! explicit, auditable invocation order.

use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::{Entity, EntityRef, Result};

/// A transaction-lifecycle hook
///
/// Write notifications return whether the observer modified entity state.
/// Every built-in observer defers its side effects into the context and
/// answers `false`; the manager currently discards the flag, so it carries
/// meaning only for external observers layered on this trait.
/// `before_commit` may veto the transaction by returning an error,
/// which the manager turns into a rollback with that error as the reason.
/// `after_completion` runs strictly after the commit/rollback decision is
/// final and must never fail the transaction retroactively.
pub trait EntityObserver: Send + Sync {
    /// Short stable name, used in logs
    fn name(&self) -> &'static str;

    /// An insert-type write was registered
    fn on_insert(&self, _ctx: &mut TransactionContext, _entity: &Entity) -> bool {
        false
    }

    /// An update-type write was registered
    fn on_update(&self, _ctx: &mut TransactionContext, _entity: &Entity) -> bool {
        false
    }

    /// A delete was registered
    fn on_delete(&self, _ctx: &mut TransactionContext, _entity_ref: &EntityRef) -> bool {
        false
    }

    /// Pre-commit pass; an error aborts the transaction with that reason
    fn before_commit(&self, _ctx: &mut TransactionContext) -> Result<()> {
        Ok(())
    }

    /// The transaction completed with the given outcome
    fn after_completion(&self, _ctx: &mut TransactionContext, _outcome: TransactionOutcome) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl EntityObserver for Inert {
        fn name(&self) -> &'static str {
            "inert"
        }
    }

    #[test]
    fn test_default_hooks_are_no_ops() {
        let observer = Inert;
        let mut ctx = TransactionContext::new(1);
        let entity = limsdb_core::Entity::new(
            limsdb_core::EntityId::new(1),
            limsdb_core::EntityKind::Project,
            limsdb_core::EntityType::new("P"),
        );

        assert!(!observer.on_insert(&mut ctx, &entity));
        assert!(!observer.on_update(&mut ctx, &entity));
        assert!(!observer.on_delete(&mut ctx, &entity.entity_ref()));
        assert!(observer.before_commit(&mut ctx).is_ok());
        observer.after_completion(&mut ctx, TransactionOutcome::Committed);
    }
}

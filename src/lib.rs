//! limsdb - Embedded object-persistence core for laboratory information
//! management
//!
//! limsdb persists typed laboratory entities (samples, experiments, data
//! sets, materials, and the authorization entities governing access to them)
//! through transactions with an interceptor pipeline: pre-commit script
//! validation, commit-gated scheduling of dynamic-property and full-text
//! index work, session permission invalidation, and a store-wide sample
//! write lock.
//!
//! # Quick Start
//!
//! ```ignore
//! use limsdb::{Database, Entity, EntityId, EntityKind, EntityType};
//!
//! let db = Database::new();
//!
//! db.transaction(|txn, ctx| {
//!     let sample = Entity::new(
//!         EntityId::new(1),
//!         EntityKind::Sample,
//!         EntityType::new("BACTERIA"),
//!     );
//!     txn.insert(ctx, sample)
//! })?;
//! ```
//!
//! # Architecture
//!
//! The [`Database`] assembles the layers: `limsdb-core` (types, errors,
//! collaborator traits), `limsdb-storage` (entity store and work backlogs),
//! `limsdb-concurrency` (the transaction manager and observer pipeline), and
//! `limsdb-engine` (composition root, sessions, script registry).

pub use limsdb_concurrency::{
    EntityObserver, SampleLock, TransactionContext, TransactionManager, TransactionMetrics,
    TransactionOutcome, TransactionStatus,
};
pub use limsdb_core::{
    Entity, EntityId, EntityKind, EntityRef, EntityType, Error, PropertyValue, Result,
    ScheduledEvaluation, ValidationRequests, ValidationScript,
};
pub use limsdb_engine::{Database, ScriptRegistry, SessionRegistry};
pub use limsdb_storage::EntityStore;

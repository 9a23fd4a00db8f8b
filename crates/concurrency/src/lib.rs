//! Interceptor pipeline for limsdb
//!
//! This crate implements the entity-mutation hooks that run inside every
//! transaction:
//! - TransactionContext: per-transaction state, write buffering, lifecycle
//! - EntityValidationCoordinator: pre-commit validation state machine
//! - DynamicPropertyScheduler / FullTextIndexScheduler: commit-gated work queues
//! - SampleLock: process-wide reentrant write gate for sample entities
//! - SessionInvalidationObserver: post-commit authorization cache broadcast
//! - TransactionManager: the commit/rollback orchestrator invoking the hooks
//!   in a fixed declared order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod indexing;
pub mod manager;
pub mod observer;
pub mod properties;
pub mod sample_lock;
pub mod sessions;
pub mod transaction;
pub mod validation;

pub use indexing::FullTextIndexScheduler;
pub use manager::{TransactionManager, TransactionMetrics};
pub use observer::EntityObserver;
pub use properties::DynamicPropertyScheduler;
pub use sample_lock::{SampleLock, SampleLockHold, SampleLockObserver};
pub use sessions::SessionInvalidationObserver;
pub use transaction::{TransactionContext, TransactionOutcome, TransactionStatus};
pub use validation::{EntityValidationCoordinator, PendingValidationSet, ValidationPhase};

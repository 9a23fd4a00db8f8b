//! Core types for limsdb
//!
//! This crate defines the entity model shared by every layer:
//! - Entity identity, kinds, and kind-level capabilities
//! - Typed user-defined properties and validation scripts
//! - Scheduled-work requests (dynamic properties, full-text index)
//! - Collaborator traits (validation engine, backlogs, session broadcast)
//! - Error types
//!
//! No layer below this crate; everything depends on it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod schedule;
pub mod traits;
pub mod types;

pub use entity::{Entity, EntityType, PropertyValue, ValidationScript};
pub use error::{Error, Result};
pub use schedule::{EvaluationTargets, IndexUpdateRequest, ScheduledEvaluation};
pub use traits::{
    EvaluationBacklog, IndexBacklog, SessionBroadcaster, ValidationEngine, ValidationRequests,
};
pub use types::{EntityId, EntityKind, EntityRef};

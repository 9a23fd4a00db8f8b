//! Engine layer for limsdb
//!
//! This crate assembles the lower layers into a usable database:
//! - Database: composition root wiring the store, backlogs, sessions,
//!   sample lock, and script registry into the observer pipeline
//! - SessionRegistry: live user sessions with staleness broadcast
//! - ScriptRegistry: name-indexed validation script bodies
//!
//! The engine is the only component that knows the full observer order and
//! the concrete backlog/session implementations behind the core's traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod script;
pub mod sessions;

pub use database::Database;
pub use script::{ScriptFn, ScriptRegistry};
pub use sessions::{Session, SessionRegistry};

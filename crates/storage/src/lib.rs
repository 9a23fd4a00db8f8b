//! Storage layer for limsdb
//!
//! In-memory stand-ins for the external persistence collaborators:
//! - [`EntityStore`]: typed record store the transaction manager flushes
//!   committed write sets into
//! - [`InMemoryEvaluationBacklog`] / [`InMemoryIndexBacklog`]: durable work
//!   queues consumed asynchronously outside this core

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backlog;
pub mod store;

pub use backlog::{InMemoryEvaluationBacklog, InMemoryIndexBacklog};
pub use store::EntityStore;

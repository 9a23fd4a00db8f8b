//! Validation script registry
//!
//! Entity types name their validation script; this registry maps those names
//! to executable script bodies and implements the engine seam the validation
//! coordinator calls through. Scripts are plain closures here: the hosting
//! application decides what language actually backs them.

use limsdb_core::{
    Entity, Error, Result, ValidationEngine, ValidationRequests, ValidationScript,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// An executable validation script body
///
/// Returns `Ok(None)` to accept, `Ok(Some(message))` to reject, `Err` on an
/// execution fault. May request validation of further entities through the
/// collector.
pub type ScriptFn =
    Box<dyn Fn(&Entity, bool, &mut ValidationRequests) -> Result<Option<String>> + Send + Sync>;

/// Name-indexed registry of validation script bodies
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: RwLock<HashMap<String, ScriptFn>>,
}

impl ScriptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ScriptRegistry::default()
    }

    /// Register a script body under a name, replacing any previous body
    pub fn register(
        &self,
        name: impl Into<String>,
        body: impl Fn(&Entity, bool, &mut ValidationRequests) -> Result<Option<String>>
            + Send
            + Sync
            + 'static,
    ) {
        let name = name.into();
        debug!(target: "limsdb::validation", script = %name, "Script registered");
        self.scripts.write().insert(name, Box::new(body));
    }

    /// Whether a script body is registered under the name
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.read().contains_key(name)
    }

    /// Number of registered scripts
    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }
}

impl ValidationEngine for ScriptRegistry {
    fn evaluate(
        &self,
        script: &ValidationScript,
        entity: &Entity,
        is_new: bool,
        requests: &mut ValidationRequests,
    ) -> Result<Option<String>> {
        let scripts = self.scripts.read();
        let body = scripts
            .get(script.name.as_str())
            .ok_or_else(|| Error::Evaluation(format!("no such script: {}", script.name)))?;
        body(entity, is_new, requests)
    }
}

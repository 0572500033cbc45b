//! Host module loading for dynamic `import()`.
//!
//! `import(specifier)` returns a pending promise and queues a
//! [`Job::DynamicImport`](crate::Job::DynamicImport). When that job runs,
//! the engine asks the installed [`ModuleLoader`] for the module namespace
//! and settles the promise with the answer.

use core_types::{ErrorKind, JsError, Value};
use rustc_hash::FxHashMap;

/// Host hook resolving module specifiers.
pub trait ModuleLoader {
    /// Namespace value for `specifier`, or the error the import rejects with.
    fn load(&mut self, specifier: &str) -> Result<Value, JsError>;
}

/// Default loader: a fixed table of preloaded namespaces.
///
/// An empty registry rejects every import.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, Value>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the namespace for `specifier`.
    pub fn register(&mut self, specifier: impl Into<String>, namespace: Value) {
        self.modules.insert(specifier.into(), namespace);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&mut self, specifier: &str) -> Result<Value, JsError> {
        match self.modules.get(specifier) {
            Some(namespace) => Ok(namespace.clone()),
            None => {
                tracing::debug!(specifier, "module not found");
                Err(JsError::new(
                    ErrorKind::TypeError,
                    format!("Cannot find module '{}'", specifier),
                ))
            }
        }
    }
}

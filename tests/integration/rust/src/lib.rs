//! Integration test suite for the engine core
//!
//! This crate verifies that the object model, the interpreter and the async
//! runtime work together across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use async_runtime;
    pub use core_types;
    pub use interpreter;
    pub use object_model;
}

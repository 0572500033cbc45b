//! Tree-walking JavaScript interpreter
//!
//! This crate evaluates a typed AST ([`node`]) against a realm built on
//! [`object_model`]:
//! - Every property-access node owns an inline cache chain that specializes
//!   on receiver shapes and degrades to a generic entry past a limit
//! - Expressions have typed entry points (`int`, `double`, `boolean`, `void`)
//!   next to the generic value evaluation
//! - Generator, async function and async generator bodies suspend by
//!   unwinding and resume by re-entering the tree with saved node states
//! - Promise jobs run on an explicit queue drained by the host
//!
//! # Example
//!
//! ```
//! use interpreter::builder::*;
//! use interpreter::{FunctionBuilder, Interpreter};
//! use core_types::Value;
//!
//! let mut interp = Interpreter::new();
//! let gen = FunctionBuilder::generator("count")
//!     .finish(vec![
//!         expr_stmt(yield_(Some(int(1)))),
//!         expr_stmt(yield_(Some(int(2)))),
//!     ])
//!     .unwrap();
//! let script = FunctionBuilder::script()
//!     .finish(vec![
//!         function_decl(gen),
//!         const_("it", call(ident("count"), vec![])),
//!         expr_stmt(call(member(ident("it"), "next"), vec![])),
//!         expr_stmt(member(call(member(ident("it"), "next"), vec![]), "value")),
//!     ])
//!     .unwrap();
//! assert_eq!(interp.run(&script).unwrap(), Value::Smi(2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod async_function;
mod async_generator;
pub mod builder;
mod builtins;
mod cancel;
mod config;
mod context;
mod error;
mod eval;
mod exec;
mod function;
mod generator;
pub mod inline_cache;
mod interpreter;
pub mod node;
mod operations;
mod promise_ops;
mod property;
mod realm;
mod resumable;
mod scope;

// Re-export main types at crate root
pub use builder::FunctionBuilder;
pub use cancel::CancellationToken;
pub use config::{ConfigError, EngineConfig};
pub use error::{Abrupt, Completion, EngineError, Eval};
pub use function::{CallArgs, NativeFn};
pub use generator::GeneratorState;
pub use inline_cache::{CacheStats, GetCache, HasCache, PrimitiveKind, SetCache};
pub use interpreter::{EngineSnapshot, Interpreter};
pub use node::{Expr, FunctionCode, FunctionKind, Stmt};

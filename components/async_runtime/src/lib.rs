//! Async runtime for JavaScript execution.
//!
//! This crate provides the engine-independent parts of asynchronous
//! execution:
//! - Promise records with settle-once semantics and reaction lists
//! - The FIFO job queue and the [`JobHost`] hook that runs jobs
//! - Async generator request queues
//! - Unhandled rejection tracking
//! - Host module loading for dynamic `import()`
//!
//! # Overview
//!
//! - [`PromiseRecord`] - State of one promise object
//! - [`JobQueue`] - Pending reaction and thenable jobs
//! - [`AsyncGeneratorQueue`] - FIFO of next/return/throw requests
//! - [`RejectionTracker`] - Host hook for unhandled rejections
//! - [`ModuleLoader`] - Host hook resolving `import()` specifiers
//!
//! # Examples
//!
//! ```
//! use async_runtime::{Handler, Job, JobQueue, PromiseReaction, PromiseRecord, ReactionKind};
//! use core_types::Value;
//!
//! let mut promise = PromiseRecord::new();
//! let mut jobs = JobQueue::new();
//! promise.add_reactions(
//!     PromiseReaction::new(ReactionKind::Fulfill, Handler::PassThrough, None),
//!     PromiseReaction::new(ReactionKind::Reject, Handler::PassThrough, None),
//! );
//! for reaction in promise.fulfill(Value::Smi(1)) {
//!     jobs.enqueue(Job::Reaction { reaction, argument: Value::Smi(1) });
//! }
//! assert_eq!(jobs.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod async_generator;
pub mod job_queue;
pub mod module;
pub mod promise;
pub mod rejection;

// Re-export main types at crate root
pub use async_generator::{
    AsyncGeneratorQueue, AsyncGeneratorRequest, AsyncGeneratorState, CompletionKind,
};
pub use job_queue::{drain_all, drain_one_job, Job, JobHost, JobQueue};
pub use module::{ModuleLoader, ModuleRegistry};
pub use promise::{Handler, PromiseReaction, PromiseRecord, PromiseState, ReactionKind};
pub use rejection::{RecordingTracker, RejectionOperation, RejectionTracker};

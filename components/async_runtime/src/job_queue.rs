//! Job queue management.
//!
//! Promise reaction jobs and dynamic-import jobs are queued in strict FIFO order and run by the host between
//! top-level executions. Running a job needs the whole engine, so the queue
//! itself only stores jobs and the engine plugs in through [`JobHost`].

use std::collections::VecDeque;

use core_types::{ObjectId, Value};

use crate::promise::PromiseReaction;

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Run a promise reaction with the settled value.
    Reaction {
        /// The reaction to run
        reaction: PromiseReaction,
        /// Fulfillment value or rejection reason
        argument: Value,
    },
    /// Call `then` on a thenable that resolved `promise`.
    ResolveThenable {
        /// Promise being resolved
        promise: ObjectId,
        /// The thenable object
        thenable: Value,
        /// The thenable's `then` method, already looked up
        then: Value,
    },
    /// Load a module for `import()` and settle `promise` with its namespace.
    DynamicImport {
        /// Module specifier, already converted to a string
        specifier: String,
        /// Promise returned by `import()`
        promise: ObjectId,
    },
}

/// A FIFO queue for promise and import jobs.
#[derive(Debug, Default)]
pub struct JobQueue {
    queue: VecDeque<Job>,
    enqueued: u64,
}

impl JobQueue {
    /// Creates a new empty JobQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job to the end of the queue.
    pub fn enqueue(&mut self, job: Job) {
        self.enqueued += 1;
        tracing::trace!(pending = self.queue.len() + 1, "job enqueued");
        self.queue.push_back(job);
    }

    /// Removes and returns the next job from the queue.
    pub fn dequeue(&mut self) -> Option<Job> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of jobs in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Total number of jobs ever enqueued.
    pub fn total_enqueued(&self) -> u64 {
        self.enqueued
    }
}

/// Engine side of the job loop.
pub trait JobHost {
    /// Error that aborts draining (internal errors, cancellation).
    type Error;

    /// The queue owned by the host.
    fn job_queue(&mut self) -> &mut JobQueue;

    /// Run one job to completion.
    fn run_job(&mut self, job: Job) -> Result<(), Self::Error>;
}

/// Run the oldest pending job. Returns false when the queue was empty.
pub fn drain_one_job<H: JobHost + ?Sized>(host: &mut H) -> Result<bool, H::Error> {
    match host.job_queue().dequeue() {
        Some(job) => {
            host.run_job(job)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Run jobs until the queue is empty, including jobs enqueued while
/// draining. Returns the number of jobs run.
pub fn drain_all<H: JobHost + ?Sized>(host: &mut H) -> Result<usize, H::Error> {
    let mut count = 0;
    while drain_one_job(host)? {
        count += 1;
    }
    tracing::debug!(jobs = count, "job queue drained");
    Ok(count)
}

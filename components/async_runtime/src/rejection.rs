//! Unhandled rejection tracking.
//!
//! Mirrors the host hook `HostPromiseRejectionTracker`: the engine reports a
//! `Reject` when a promise is rejected with no handler attached and a
//! `Handle` when a handler is later attached to such a promise.

use core_types::{ObjectId, Value};

/// Kind of rejection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// Rejected with no handler attached
    Reject,
    /// Handler attached to a previously unhandled rejected promise
    Handle,
}

/// Host hook receiving rejection reports.
pub trait RejectionTracker {
    /// Called once per report.
    fn track(&mut self, promise: ObjectId, operation: RejectionOperation, reason: &Value);
}

/// Default tracker: records every report.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: Vec<(ObjectId, RejectionOperation)>,
}

impl RecordingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports in arrival order.
    pub fn events(&self) -> &[(ObjectId, RejectionOperation)] {
        &self.events
    }

    /// Promises that were reported rejected and not handled since.
    pub fn unhandled(&self) -> Vec<ObjectId> {
        let mut open: Vec<ObjectId> = Vec::new();
        for (promise, operation) in &self.events {
            match operation {
                RejectionOperation::Reject => open.push(*promise),
                RejectionOperation::Handle => open.retain(|p| p != promise),
            }
        }
        open
    }
}

impl RejectionTracker for RecordingTracker {
    fn track(&mut self, promise: ObjectId, operation: RejectionOperation, reason: &Value) {
        if operation == RejectionOperation::Reject {
            tracing::debug!(promise = promise.0, %reason, "unhandled promise rejection");
        }
        self.events.push((promise, operation));
    }
}

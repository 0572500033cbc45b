//! Async generator request queue
//!
//! Every call to `next`, `return` or `throw` on an async generator appends a
//! request here and gets back the request's promise. The interpreter's drive
//! loop serves requests one at a time from the head; a request stays at the
//! head until its promise is settled, which keeps at most one request in
//! flight and settles promises in call order.

use std::collections::VecDeque;

use core_types::{ObjectId, Value};

/// AsyncGenerator internal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsyncGeneratorState {
    /// Generator created but never executed (initial state)
    #[default]
    SuspendedStart,
    /// Generator paused at a yield expression
    SuspendedYield,
    /// Generator is currently executing code, or awaiting inside the body
    Executing,
    /// A `return` request is awaiting its operand after completion
    AwaitingReturn,
    /// Generator has finished execution
    Completed,
    /// Execution was cancelled; treated like `Completed` from then on
    Abandoned,
}

impl AsyncGeneratorState {
    /// Whether the body can no longer run.
    pub fn is_finished(self) -> bool {
        matches!(self, AsyncGeneratorState::Completed | AsyncGeneratorState::Abandoned)
    }

    /// Whether a request is currently being served.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            AsyncGeneratorState::Executing | AsyncGeneratorState::AwaitingReturn
        )
    }
}

/// Type of async generator request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// next(value)
    Next,
    /// return(value)
    Return,
    /// throw(exception)
    Throw,
}

/// A pending request in the async generator queue
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncGeneratorRequest {
    /// The kind of request (next, return, throw)
    pub kind: CompletionKind,
    /// The argument passed by the caller
    pub value: Value,
    /// Promise returned to the caller, settled when the request completes
    pub promise: ObjectId,
}

/// Queue of requests plus the generator state.
#[derive(Debug, Default)]
pub struct AsyncGeneratorQueue {
    state: AsyncGeneratorState,
    requests: VecDeque<AsyncGeneratorRequest>,
}

impl AsyncGeneratorQueue {
    /// A queue for a freshly created generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> AsyncGeneratorState {
        self.state
    }

    /// Change state.
    pub fn set_state(&mut self, state: AsyncGeneratorState) {
        if self.state != state {
            tracing::trace!(from = ?self.state, to = ?state, "async generator state change");
        }
        self.state = state;
    }

    /// Append a request. Returns true when the caller should start draining,
    /// that is when no request is already being served.
    pub fn enqueue(&mut self, request: AsyncGeneratorRequest) -> bool {
        self.requests.push_back(request);
        !self.state.is_busy()
    }

    /// The request currently being served.
    pub fn head(&self) -> Option<&AsyncGeneratorRequest> {
        self.requests.front()
    }

    /// Remove the head request once its promise has been settled.
    pub fn complete_head(&mut self) -> Option<AsyncGeneratorRequest> {
        self.requests.pop_front()
    }

    /// Number of queued requests, including the one in flight.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether there are no queued requests.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

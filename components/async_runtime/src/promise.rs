//! Promise records and reactions.
//!
//! A [`PromiseRecord`] is the engine-internal state of one promise object.
//! It knows nothing about calling functions: settling hands back the
//! reactions that became due, and the caller turns them into jobs. This
//! keeps "settle exactly once" and "never run a handler inline" local to
//! this module.

use core_types::{ObjectId, Value};

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    #[default]
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

/// Which list a reaction was registered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    /// Runs when the promise fulfills
    Fulfill,
    /// Runs when the promise rejects
    Reject,
}

/// What a reaction job does with the settled value.
#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    /// No handler: fulfill reactions pass the value through, reject
    /// reactions rethrow the reason.
    PassThrough,
    /// Call a JavaScript function with the settled value.
    Callable(Value),
    /// Resume the suspended generator or async function `ObjectId`.
    /// Fulfillment resumes with a normal completion, rejection with a
    /// throw completion.
    Resume(ObjectId),
    /// Async generator in `AwaitingReturn`: the awaited return value
    /// settled, finish the head request.
    AsyncGeneratorReturn(ObjectId),
    /// `finally` callback: call it, then pass the original outcome through.
    Finally(Value),
    /// Ignore the argument and produce this value.
    ReturnValue(Value),
    /// Ignore the argument and throw this value.
    ThrowValue(Value),
}

/// A reaction to be triggered when a Promise settles.
#[derive(Debug, Clone, PartialEq)]
pub struct PromiseReaction {
    /// Fulfill or reject list
    pub kind: ReactionKind,
    /// What to run
    pub handler: Handler,
    /// Derived promise resolved with the handler's outcome, if any
    pub capability: Option<ObjectId>,
}

impl PromiseReaction {
    /// Build a reaction.
    pub fn new(kind: ReactionKind, handler: Handler, capability: Option<ObjectId>) -> Self {
        Self {
            kind,
            handler,
            capability,
        }
    }
}

/// Internal state of a promise object.
///
/// # Examples
///
/// ```
/// use async_runtime::{PromiseRecord, PromiseState};
/// use core_types::Value;
///
/// let mut promise = PromiseRecord::new();
/// assert_eq!(promise.state(), PromiseState::Pending);
///
/// promise.fulfill(Value::Smi(42));
/// promise.reject(Value::Smi(0));
/// assert_eq!(promise.state(), PromiseState::Fulfilled);
/// assert_eq!(promise.result(), &Value::Smi(42));
/// ```
#[derive(Debug, Default)]
pub struct PromiseRecord {
    state: PromiseState,
    result: Value,
    fulfill_reactions: Vec<PromiseReaction>,
    reject_reactions: Vec<PromiseReaction>,
    is_handled: bool,
}

impl PromiseRecord {
    /// Creates a new pending promise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        self.state
    }

    /// Whether the promise has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.state == PromiseState::Pending
    }

    /// Fulfillment value or rejection reason; `undefined` while pending.
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Whether a handler was ever attached (`[[PromiseIsHandled]]`).
    pub fn is_handled(&self) -> bool {
        self.is_handled
    }

    /// Mark the promise as handled without attaching a reaction.
    pub fn mark_handled(&mut self) {
        self.is_handled = true;
    }

    /// Number of reactions waiting for settlement.
    pub fn pending_reactions(&self) -> usize {
        self.fulfill_reactions.len() + self.reject_reactions.len()
    }

    /// Fulfill the promise. Returns the reactions that are now due, or an
    /// empty list if the promise was already settled.
    pub fn fulfill(&mut self, value: Value) -> Vec<PromiseReaction> {
        self.settle(PromiseState::Fulfilled, value)
    }

    /// Reject the promise. Returns the reactions that are now due, or an
    /// empty list if the promise was already settled.
    pub fn reject(&mut self, reason: Value) -> Vec<PromiseReaction> {
        self.settle(PromiseState::Rejected, reason)
    }

    fn settle(&mut self, state: PromiseState, value: Value) -> Vec<PromiseReaction> {
        if !self.is_pending() {
            tracing::trace!(?state, "ignoring settlement of settled promise");
            return Vec::new();
        }
        self.state = state;
        self.result = value;
        let fulfill = std::mem::take(&mut self.fulfill_reactions);
        let reject = std::mem::take(&mut self.reject_reactions);
        match state {
            PromiseState::Fulfilled => fulfill,
            _ => reject,
        }
    }

    /// Register a fulfill/reject reaction pair (PerformPromiseThen).
    ///
    /// While pending, the reactions are stored. Once settled, the matching
    /// reaction is returned together with the settled value so that the
    /// caller enqueues it; handlers never run inline.
    pub fn add_reactions(
        &mut self,
        on_fulfilled: PromiseReaction,
        on_rejected: PromiseReaction,
    ) -> Option<(PromiseReaction, Value)> {
        self.is_handled = true;
        match self.state() {
            PromiseState::Pending => {
                self.fulfill_reactions.push(on_fulfilled);
                self.reject_reactions.push(on_rejected);
                None
            }
            PromiseState::Fulfilled => Some((on_fulfilled, self.result.clone())),
            PromiseState::Rejected => Some((on_rejected, self.result.clone())),
        }
    }
}

//! Execution contexts and suspended coroutines.
//!
//! The interpreter keeps one [`ExecutionContext`] per active call. Frames
//! running a generator, async function or async generator body also carry
//! [`ResumeData`]: the per-node resume states of that body, the completion
//! injected by the resumer, and the reason the body last suspended.
//!
//! Between resumptions the frame does not exist. Its persistent parts are
//! parked in a [`Coroutine`] owned by the generator object.

use std::rc::Rc;

use core_types::{ObjectId, Value};

use crate::error::Completion;
use crate::node::{FunctionCode, FunctionKind};
use crate::resumable::NodeState;
use crate::scope::ScopeRef;

/// Why a resumable body stopped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Suspension {
    /// `yield value`; the resumer gets `value` back
    Yield(Value),
    /// `await`; resume reactions are registered on the awaited promise
    Await,
}

/// Resume bookkeeping of a frame running a resumable body.
#[derive(Debug)]
pub(crate) struct ResumeData {
    /// Generator / async function object owning the body
    pub owner: ObjectId,
    /// Kind of the running body
    pub kind: FunctionKind,
    /// Saved state per resume slot
    pub slots: Vec<Option<NodeState>>,
    /// Completion delivered to the suspended `yield`/`await`
    pub input: Option<Completion>,
    /// Set by the node that suspended
    pub suspension: Option<Suspension>,
}

/// One active call.
#[derive(Debug)]
pub(crate) struct ExecutionContext {
    /// `this` binding
    pub this_value: Value,
    /// Innermost scope
    pub scope: ScopeRef,
    /// Scope holding parameters and hoisted declarations
    pub function_scope: ScopeRef,
    /// Strict mode code
    pub strict: bool,
    /// Script frames record the value of the last expression statement
    pub completion: Option<Value>,
    /// Present for resumable bodies
    pub resume: Option<ResumeData>,
}

impl ExecutionContext {
    /// Frame for ordinary code running in `scope`.
    pub(crate) fn new(this_value: Value, scope: ScopeRef, strict: bool) -> Self {
        Self {
            this_value,
            function_scope: Rc::clone(&scope),
            scope,
            strict,
            completion: None,
            resume: None,
        }
    }
}

/// Persistent state of a suspended resumable body.
#[derive(Debug)]
pub(crate) struct Coroutine {
    /// Code being run
    pub code: Rc<FunctionCode>,
    /// `this` binding of the call
    pub this_value: Value,
    /// Scope with parameters and hoisted declarations
    pub function_scope: ScopeRef,
    /// Strict mode code
    pub strict: bool,
    /// Saved resume states
    pub slots: Vec<Option<NodeState>>,
}

impl Coroutine {
    /// A coroutine that has not started.
    pub(crate) fn new(
        code: Rc<FunctionCode>,
        this_value: Value,
        function_scope: ScopeRef,
        strict: bool,
    ) -> Self {
        let slots = std::iter::repeat_with(|| None)
            .take(code.slot_count as usize)
            .collect();
        Self {
            code,
            this_value,
            function_scope,
            strict,
            slots,
        }
    }

    /// Frame that runs (or resumes) this coroutine on behalf of `owner`.
    pub(crate) fn enter(&mut self, owner: ObjectId, input: Option<Completion>) -> ExecutionContext {
        ExecutionContext {
            this_value: self.this_value.clone(),
            scope: Rc::clone(&self.function_scope),
            function_scope: Rc::clone(&self.function_scope),
            strict: self.strict,
            completion: None,
            resume: Some(ResumeData {
                owner,
                kind: self.code.kind,
                slots: std::mem::take(&mut self.slots),
                input,
                suspension: None,
            }),
        }
    }
}

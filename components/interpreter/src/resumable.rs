//! Resumable execution.
//!
//! Suspension is an ordinary error value: a `yield` or `await` node saves
//! its own state in its resume slot and returns `Err(Abrupt::Suspend)`.
//! Every enclosing node that has made progress saves *its* partial state on
//! the way out (evaluated operands, statement index, loop phase, iterator,
//! scope, try phase and pending completion). Resuming simply evaluates the
//! body again: each node finds its saved state, skips what it already did
//! and delegates to the child that suspended, until the suspended `yield`
//! or `await` consumes the injected completion.
//!
//! Nodes that cannot suspend have no slot and never touch this machinery.

use core_types::{ObjectId, Value};

use crate::context::{Coroutine, Suspension};
use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::node::{Expr, FunctionKind, Slot};
use crate::scope::ScopeRef;

/// Phase of a `for (;;)` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForPhase {
    /// Running the initializer
    Init,
    /// Evaluating the condition
    Test,
    /// Running the body
    Body,
    /// Evaluating the update expression
    Update,
}

/// Phase of a `try` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TryPhase {
    /// Protected block
    Block,
    /// Catch handler
    Catch,
    /// Finalizer
    Finally,
}

/// Steps of `yield` in an async generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AsyncYieldPhase {
    /// Awaiting the operand before yielding it
    AwaitOperand,
    /// Yielded, waiting for the next request
    Yielded,
    /// A `return` request arrived; awaiting its value
    AwaitReturn,
}

/// Partial progress of one node, saved when its subtree suspends.
#[derive(Debug)]
pub(crate) enum NodeState {
    /// `yield`/`await` waiting for its completion
    Suspended,
    /// `yield` inside an async generator
    AsyncYield(AsyncYieldPhase),
    /// Operands evaluated so far, in evaluation order
    Operands(Vec<Value>),
    /// Right operand of a short-circuit operator is running
    Right,
    /// Branch chosen by `if` or `?:`
    Branch(bool),
    /// Statement list position and the block scope
    Sequence {
        /// Index of the running statement or expression
        index: usize,
        /// Block scope, if the block has one
        scope: Option<ScopeRef>,
    },
    /// Declarator position
    Declaration {
        /// Index of the running declarator
        index: usize,
    },
    /// Object or array literal under construction
    Literal {
        /// The object being filled
        object: ObjectId,
        /// Index of the running entry
        index: usize,
    },
    /// `o.p op= v` / `o[k] op= v` with the target resolved and read
    Compound {
        /// Target object
        base: Value,
        /// Target key
        key: Value,
        /// Value read before the right-hand side
        old: Value,
    },
    /// `x op= v` with the old value read
    CompoundIdent {
        /// Value read before the right-hand side
        old: Value,
    },
    /// `while` / `do-while`: whether the body (not the test) is running
    Loop {
        /// Body is running
        in_body: bool,
    },
    /// `for (;;)`
    ForLoop {
        /// Running part
        phase: ForPhase,
        /// Loop scope for `let`/`const` declarations
        scope: Option<ScopeRef>,
    },
    /// `for-of` with an open iterator
    ForOf {
        /// Iterator object
        iterator: Value,
        /// Its `next` method
        next: Value,
        /// Iteration scope of the running body
        scope: ScopeRef,
    },
    /// `try` statement
    Try {
        /// Running part
        phase: TryPhase,
        /// Completion waiting for the finalizer
        pending: Option<Eval<()>>,
        /// Scope binding the catch parameter
        scope: Option<ScopeRef>,
    },
    /// `yield*` delegating to an inner iterator
    YieldStar {
        /// Inner iterator
        iterator: Value,
        /// Its `next` method
        next: Value,
    },
}

/// How a run of a resumable body ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Suspended; the coroutine can be resumed later
    Suspended(Box<Coroutine>, Suspension),
    /// Returned normally
    Returned(Value),
}

impl Interpreter {
    /// Take the saved state of `slot`, leaving it empty.
    pub(crate) fn take_state(&mut self, slot: Slot) -> Option<NodeState> {
        let slot = slot? as usize;
        self.frame
            .resume
            .as_mut()?
            .slots
            .get_mut(slot)?
            .take()
    }

    /// Store `state` in `slot`. Returns false when there is nowhere to put it.
    pub(crate) fn put_state(&mut self, slot: Slot, state: NodeState) -> bool {
        let Some(slot) = slot else {
            return false;
        };
        match self
            .frame
            .resume
            .as_mut()
            .and_then(|resume| resume.slots.get_mut(slot as usize))
        {
            Some(entry) => {
                *entry = Some(state);
                true
            }
            None => false,
        }
    }

    /// Save state into `slot` and return the suspend signal.
    pub(crate) fn suspend_with(&mut self, slot: Slot, state: NodeState) -> Abrupt {
        if self.put_state(slot, state) {
            Abrupt::Suspend
        } else {
            Abrupt::fatal("suspension outside of a resumable frame")
        }
    }

    /// Kind of the running resumable body.
    pub(crate) fn resume_kind(&self) -> Option<FunctionKind> {
        self.frame.resume.as_ref().map(|resume| resume.kind)
    }

    /// Mark the reason for the current suspension.
    pub(crate) fn set_suspension(&mut self, suspension: Suspension) -> Eval<()> {
        let resume = self
            .frame
            .resume
            .as_mut()
            .ok_or_else(|| Abrupt::fatal("yield or await outside of a resumable frame"))?;
        resume.suspension = Some(suspension);
        Ok(())
    }

    /// Completion injected by the resumer.
    pub(crate) fn take_input(&mut self) -> Eval<Completion> {
        self.frame
            .resume
            .as_mut()
            .and_then(|resume| resume.input.take())
            .ok_or_else(|| Abrupt::fatal("resumed without a completion"))
    }

    /// Object owning the running resumable body.
    pub(crate) fn resume_owner(&self) -> Eval<ObjectId> {
        self.frame
            .resume
            .as_ref()
            .map(|resume| resume.owner)
            .ok_or_else(|| Abrupt::fatal("no resumable frame"))
    }

    /// Evaluate `exprs` in order, continuing after the ones already saved
    /// in `slot`. On suspension the values computed so far are saved.
    pub(crate) fn eval_operands(&mut self, slot: Slot, exprs: &[&Expr]) -> Eval<Vec<Value>> {
        let mut values = match self.take_state(slot) {
            Some(NodeState::Operands(values)) => values,
            _ => Vec::with_capacity(exprs.len()),
        };
        while values.len() < exprs.len() {
            match self.eval_value(exprs[values.len()]) {
                Ok(value) => values.push(value),
                Err(Abrupt::Suspend) => {
                    return Err(self.suspend_with(slot, NodeState::Operands(values)))
                }
                Err(other) => return Err(other),
            }
        }
        Ok(values)
    }

    /// Run `coroutine` until it suspends or finishes.
    ///
    /// `input` is `None` for the first run and the injected completion
    /// afterwards. The frame is pushed for the duration of the run and its
    /// resume states are moved back into the coroutine on suspension.
    pub(crate) fn run_coroutine(
        &mut self,
        owner: ObjectId,
        mut coroutine: Box<Coroutine>,
        input: Option<Completion>,
    ) -> Eval<Outcome> {
        let code = std::rc::Rc::clone(&coroutine.code);
        let frame = coroutine.enter(owner, input);
        self.push_frame(frame)?;
        let result = self.exec_block(&code.body);
        let frame = self.pop_frame()?;
        match result {
            Ok(()) => Ok(Outcome::Returned(Value::Undefined)),
            Err(Abrupt::Return(value)) => Ok(Outcome::Returned(value)),
            Err(Abrupt::Suspend) => {
                let resume = frame
                    .resume
                    .ok_or_else(|| Abrupt::fatal("resumable frame lost its resume data"))?;
                let suspension = resume
                    .suspension
                    .ok_or_else(|| Abrupt::fatal("suspended without a reason"))?;
                coroutine.slots = resume.slots;
                Ok(Outcome::Suspended(coroutine, suspension))
            }
            Err(Abrupt::Break(_)) | Err(Abrupt::Continue(_)) => {
                Err(Abrupt::fatal("break or continue escaped a function body"))
            }
            Err(other) => Err(other),
        }
    }
}

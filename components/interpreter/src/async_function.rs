//! Async functions.
//!
//! Calling an async function creates a promise and an owner object holding
//! the body's coroutine, then runs the body synchronously up to its first
//! `await`. Each settled await enqueues a resume reaction that continues the
//! body from the job queue.

use core_types::{ObjectId, Value};
use object_model::ObjectClass;

use crate::context::{Coroutine, Suspension};
use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::resumable::Outcome;

/// Owner of a running async function body.
#[derive(Debug)]
pub(crate) struct AsyncFunctionObject {
    pub coroutine: Option<Box<Coroutine>>,
    pub promise: ObjectId,
}

impl Interpreter {
    /// Start an async function body; returns its promise.
    pub(crate) fn start_async_function(&mut self, coroutine: Coroutine) -> Eval<Value> {
        let promise = self.new_promise();
        let owner = self.create_object_with_proto(
            None,
            ObjectClass::Internal(Box::new(AsyncFunctionObject {
                coroutine: None,
                promise,
            })),
        );
        self.step_async_function(owner, Box::new(coroutine), None)?;
        Ok(Value::Object(promise))
    }

    /// Continue after an await settled.
    pub(crate) fn resume_async_function(&mut self, owner: ObjectId, completion: Completion) -> Eval<()> {
        let coroutine = self
            .realm
            .heap
            .get_mut(owner)
            .and_then(|object| object.internal_mut::<AsyncFunctionObject>())
            .and_then(|data| data.coroutine.take())
            .ok_or_else(|| Abrupt::fatal("async function resumed while not suspended"))?;
        self.step_async_function(owner, coroutine, Some(completion))
    }

    fn step_async_function(
        &mut self,
        owner: ObjectId,
        coroutine: Box<Coroutine>,
        input: Option<Completion>,
    ) -> Eval<()> {
        let promise = self
            .realm
            .heap
            .get(owner)
            .and_then(|object| object.internal::<AsyncFunctionObject>())
            .map(|data| data.promise)
            .ok_or_else(|| Abrupt::fatal("async function owner lost its payload"))?;
        match self.run_coroutine(owner, coroutine, input) {
            Ok(Outcome::Suspended(coroutine, Suspension::Await)) => {
                if let Some(data) = self.realm.heap[owner].internal_mut::<AsyncFunctionObject>() {
                    data.coroutine = Some(coroutine);
                }
                Ok(())
            }
            Ok(Outcome::Suspended(_, Suspension::Yield(_))) => {
                Err(Abrupt::fatal("yield inside an async function"))
            }
            Ok(Outcome::Returned(value)) => self.resolve_promise(promise, value),
            Err(Abrupt::Throw(error)) => {
                self.reject_promise(promise, error);
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}

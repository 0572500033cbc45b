//! Async generator objects and their drive loop.
//!
//! `next`, `return` and `throw` append a request to the generator's
//! [`AsyncGeneratorQueue`] and return the request's promise. The drive loop
//! serves the head request whenever the generator is idle; an `await` in
//! the body leaves the generator `Executing` until the resume reaction runs,
//! so later requests wait in the queue.

use async_runtime::{
    AsyncGeneratorQueue, AsyncGeneratorRequest, AsyncGeneratorState, CompletionKind, Handler,
    ReactionKind,
};
use core_types::{ErrorKind, ObjectId, Value};
use object_model::ObjectClass;

use crate::context::{Coroutine, Suspension};
use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::resumable::Outcome;

#[derive(Debug)]
pub(crate) struct AsyncGeneratorObject {
    pub queue: AsyncGeneratorQueue,
    pub coroutine: Option<Box<Coroutine>>,
}

impl Interpreter {
    pub(crate) fn create_async_generator(&mut self, proto: ObjectId, coroutine: Coroutine) -> ObjectId {
        let data = AsyncGeneratorObject {
            queue: AsyncGeneratorQueue::new(),
            coroutine: Some(Box::new(coroutine)),
        };
        self.create_object_with_proto(Some(proto), ObjectClass::Internal(Box::new(data)))
    }

    /// State of an async generator object, `None` for anything else.
    pub fn async_generator_state(&self, value: &Value) -> Option<AsyncGeneratorState> {
        let object = self.realm.heap.get(value.as_object()?)?;
        object
            .internal::<AsyncGeneratorObject>()
            .map(|generator| generator.queue.state())
    }

    fn async_generator_data(&mut self, generator: ObjectId) -> Eval<&mut AsyncGeneratorObject> {
        self.realm
            .heap
            .get_mut(generator)
            .and_then(|object| object.internal_mut::<AsyncGeneratorObject>())
            .ok_or_else(|| Abrupt::fatal("async generator payload missing"))
    }

    fn set_async_generator_state(&mut self, generator: ObjectId, state: AsyncGeneratorState) -> Eval<()> {
        self.async_generator_data(generator)?.queue.set_state(state);
        Ok(())
    }

    /// Queue a request and return its promise. A receiver that is not an
    /// async generator gets a rejected promise.
    pub(crate) fn async_generator_enqueue(
        &mut self,
        this: &Value,
        kind: CompletionKind,
        value: Value,
    ) -> Eval<Value> {
        let promise = self.new_promise();
        let generator = match this.as_object() {
            Some(id) if self.async_generator_state(this).is_some() => id,
            _ => {
                let message = format!("{} is not an async generator", self.describe(this));
                let error = self.create_error(ErrorKind::TypeError, &message);
                self.reject_promise(promise, Value::Object(error));
                return Ok(Value::Object(promise));
            }
        };
        let request = AsyncGeneratorRequest {
            kind,
            value,
            promise,
        };
        let start = self.async_generator_data(generator)?.queue.enqueue(request);
        tracing::trace!(generator = generator.0, ?kind, start, "async generator request queued");
        if start {
            self.async_generator_drain(generator)?;
        }
        Ok(Value::Object(promise))
    }

    /// Serve queued requests until the queue is empty or the generator
    /// becomes busy.
    fn async_generator_drain(&mut self, generator: ObjectId) -> Eval<()> {
        loop {
            let data = self.async_generator_data(generator)?;
            let mut state = data.queue.state();
            if state.is_busy() {
                return Ok(());
            }
            let Some(request) = data.queue.head().cloned() else {
                return Ok(());
            };
            if state == AsyncGeneratorState::SuspendedStart && request.kind != CompletionKind::Next {
                data.coroutine = None;
                data.queue.set_state(AsyncGeneratorState::Completed);
                state = AsyncGeneratorState::Completed;
            }
            if state.is_finished() {
                self.serve_finished(generator, request)?;
                continue;
            }
            self.check_call_depth()?;
            let data = self.async_generator_data(generator)?;
            let coroutine = data
                .coroutine
                .take()
                .ok_or_else(|| Abrupt::fatal("suspended async generator without a coroutine"))?;
            data.queue.set_state(AsyncGeneratorState::Executing);
            let completion = match request.kind {
                CompletionKind::Next => Completion::Normal(request.value),
                CompletionKind::Return => Completion::Return(request.value),
                CompletionKind::Throw => Completion::Throw(request.value),
            };
            let input = (state == AsyncGeneratorState::SuspendedYield).then_some(completion);
            self.step_async_generator(generator, coroutine, input)?;
        }
    }

    /// Head request against a body that can no longer run.
    fn serve_finished(&mut self, generator: ObjectId, request: AsyncGeneratorRequest) -> Eval<()> {
        match request.kind {
            CompletionKind::Next => {
                let result = self.create_iter_result(Value::Undefined, true);
                self.complete_request(generator, Ok(result))
            }
            CompletionKind::Throw => self.complete_request(generator, Err(request.value)),
            CompletionKind::Return => {
                self.set_async_generator_state(generator, AsyncGeneratorState::AwaitingReturn)?;
                let awaited = self.promise_resolve(request.value).and_then(|promise| {
                    self.perform_then(
                        promise,
                        Handler::AsyncGeneratorReturn(generator),
                        Handler::AsyncGeneratorReturn(generator),
                        None,
                    )
                });
                match awaited {
                    Ok(()) => Ok(()),
                    Err(Abrupt::Throw(error)) => {
                        self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
                        self.complete_request(generator, Err(error))
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    /// Settle the head request's promise and drop it from the queue.
    fn complete_request(&mut self, generator: ObjectId, outcome: Result<Value, Value>) -> Eval<()> {
        let request = self
            .async_generator_data(generator)?
            .queue
            .complete_head()
            .ok_or_else(|| Abrupt::fatal("async generator completed an empty queue"))?;
        match outcome {
            Ok(result) => self.fulfill_promise(request.promise, result),
            Err(reason) => self.reject_promise(request.promise, reason),
        }
        Ok(())
    }

    fn step_async_generator(
        &mut self,
        generator: ObjectId,
        coroutine: Box<Coroutine>,
        input: Option<Completion>,
    ) -> Eval<()> {
        match self.run_coroutine(generator, coroutine, input) {
            Ok(Outcome::Suspended(coroutine, Suspension::Await)) => {
                self.async_generator_data(generator)?.coroutine = Some(coroutine);
                Ok(())
            }
            Ok(Outcome::Suspended(coroutine, Suspension::Yield(value))) => {
                let data = self.async_generator_data(generator)?;
                data.coroutine = Some(coroutine);
                data.queue.set_state(AsyncGeneratorState::SuspendedYield);
                let result = self.create_iter_result(value, false);
                self.complete_request(generator, Ok(result))
            }
            Ok(Outcome::Returned(value)) => {
                self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
                let result = self.create_iter_result(value, true);
                self.complete_request(generator, Ok(result))
            }
            Err(Abrupt::Throw(error)) => {
                self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
                self.complete_request(generator, Err(error))
            }
            Err(abrupt @ (Abrupt::Cancelled | Abrupt::Fatal(_))) => {
                tracing::debug!(generator = generator.0, "async generator abandoned");
                self.set_async_generator_state(generator, AsyncGeneratorState::Abandoned)?;
                Err(abrupt)
            }
            Err(other) => Err(other),
        }
    }

    /// An await inside the body settled.
    pub(crate) fn resume_async_generator(&mut self, generator: ObjectId, completion: Completion) -> Eval<()> {
        let coroutine = self
            .async_generator_data(generator)?
            .coroutine
            .take()
            .ok_or_else(|| Abrupt::fatal("async generator resumed while not suspended"))?;
        self.step_async_generator(generator, coroutine, Some(completion))?;
        self.async_generator_drain(generator)
    }

    /// The value awaited by a `return` request on a finished generator
    /// settled.
    pub(crate) fn async_generator_return_settled(
        &mut self,
        generator: ObjectId,
        kind: ReactionKind,
        argument: Value,
    ) -> Eval<()> {
        self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
        let outcome = match kind {
            ReactionKind::Fulfill => Ok(self.create_iter_result(argument, true)),
            ReactionKind::Reject => Err(argument),
        };
        self.complete_request(generator, outcome)?;
        self.async_generator_drain(generator)
    }
}

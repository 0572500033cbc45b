//! Promise operations on heap objects and the job host.
//!
//! A promise is an internal object whose payload is an
//! [`async_runtime::PromiseRecord`]. Settling collects the due reactions
//! from the record and enqueues one job per reaction; nothing runs inline.

use std::cell::Cell;
use std::rc::Rc;

use async_runtime::{
    Handler, Job, JobHost, JobQueue, PromiseReaction, PromiseRecord, PromiseState, ReactionKind,
    RejectionOperation,
};
use core_types::{ErrorKind, ObjectId, PropertyKey, Value};
use object_model::ObjectClass;

use crate::async_function::AsyncFunctionObject;
use crate::async_generator::AsyncGeneratorObject;
use crate::context::Suspension;
use crate::error::{Abrupt, Completion, Eval};
use crate::function::Callable;
use crate::interpreter::Interpreter;

impl Interpreter {
    /// Allocate a pending promise.
    pub(crate) fn new_promise(&mut self) -> ObjectId {
        let proto = self.realm.intrinsics.promise_prototype;
        self.create_object_with_proto(Some(proto), ObjectClass::Internal(Box::new(PromiseRecord::new())))
    }

    pub(crate) fn is_promise(&self, value: &Value) -> bool {
        self.promise_state(value).is_some()
    }

    fn promise_record(&mut self, promise: ObjectId) -> Eval<&mut PromiseRecord> {
        self.realm
            .heap
            .get_mut(promise)
            .and_then(|object| object.internal_mut::<PromiseRecord>())
            .ok_or_else(|| Abrupt::fatal("promise operation on a non-promise"))
    }

    fn enqueue_reactions(&mut self, reactions: Vec<PromiseReaction>, argument: &Value) {
        for reaction in reactions {
            tracing::trace!(kind = ?reaction.kind, "reaction job enqueued");
            self.realm.jobs.enqueue(Job::Reaction {
                reaction,
                argument: argument.clone(),
            });
        }
    }

    /// Fulfill `promise`. No-op once settled.
    pub(crate) fn fulfill_promise(&mut self, promise: ObjectId, value: Value) {
        let Ok(record) = self.promise_record(promise) else {
            return;
        };
        let reactions = record.fulfill(value.clone());
        self.enqueue_reactions(reactions, &value);
    }

    /// Reject `promise`. No-op once settled.
    pub(crate) fn reject_promise(&mut self, promise: ObjectId, reason: Value) {
        let Ok(record) = self.promise_record(promise) else {
            return;
        };
        let report = record.is_pending() && !record.is_handled();
        let reactions = record.reject(reason.clone());
        if report && self.config.track_rejections {
            tracing::debug!(promise = promise.0, "promise rejected without handler");
            self.realm.tracker.track(promise, RejectionOperation::Reject, &reason);
        }
        self.enqueue_reactions(reactions, &reason);
    }

    /// Resolve `promise` with `resolution`, following thenables.
    pub(crate) fn resolve_promise(&mut self, promise: ObjectId, resolution: Value) -> Eval<()> {
        if resolution == Value::Object(promise) {
            let error = self.create_error(ErrorKind::TypeError, "Chaining cycle detected for promise #<Promise>");
            self.reject_promise(promise, Value::Object(error));
            return Ok(());
        }
        if resolution.as_object().is_none() {
            self.fulfill_promise(promise, resolution);
            return Ok(());
        }
        match self.get_property(&resolution, &PropertyKey::from("then")) {
            Ok(then) if self.is_callable(&then) => {
                tracing::trace!(promise = promise.0, "resolve-thenable job enqueued");
                self.realm.jobs.enqueue(Job::ResolveThenable {
                    promise,
                    thenable: resolution,
                    then,
                });
            }
            Ok(_) => self.fulfill_promise(promise, resolution),
            Err(Abrupt::Throw(error)) => self.reject_promise(promise, error),
            Err(other) => return Err(other),
        }
        Ok(())
    }

    /// Resolve/reject function pair for `promise`, sharing one
    /// already-resolved flag.
    pub(crate) fn create_resolving_functions(&mut self, promise: ObjectId) -> (Value, Value) {
        let already_resolved = Rc::new(Cell::new(false));
        let resolve = self.create_function_object(Callable::Resolving {
            promise,
            reject: false,
            already_resolved: Rc::clone(&already_resolved),
        });
        let reject = self.create_function_object(Callable::Resolving {
            promise,
            reject: true,
            already_resolved,
        });
        (Value::Object(resolve), Value::Object(reject))
    }

    /// PerformPromiseThen. Settled promises enqueue the matching reaction
    /// immediately.
    pub(crate) fn perform_then(
        &mut self,
        promise: ObjectId,
        on_fulfilled: Handler,
        on_rejected: Handler,
        capability: Option<ObjectId>,
    ) -> Eval<()> {
        let track = self.config.track_rejections;
        let record = self.promise_record(promise)?;
        let newly_handled = record.state() == PromiseState::Rejected && !record.is_handled();
        let reason = record.result().clone();
        let due = record.add_reactions(
            PromiseReaction::new(ReactionKind::Fulfill, on_fulfilled, capability),
            PromiseReaction::new(ReactionKind::Reject, on_rejected, capability),
        );
        if newly_handled && track {
            self.realm.tracker.track(promise, RejectionOperation::Handle, &reason);
        }
        if let Some((reaction, argument)) = due {
            self.enqueue_reactions(vec![reaction], &argument);
        }
        Ok(())
    }

    /// `promise.then(onFulfilled, onRejected)`; returns the derived promise.
    pub(crate) fn promise_then(&mut self, promise: ObjectId, on_fulfilled: Value, on_rejected: Value) -> Eval<ObjectId> {
        let derived = self.new_promise();
        let on_fulfilled = self.handler_for(on_fulfilled);
        let on_rejected = self.handler_for(on_rejected);
        self.perform_then(promise, on_fulfilled, on_rejected, Some(derived))?;
        Ok(derived)
    }

    fn handler_for(&self, value: Value) -> Handler {
        if self.is_callable(&value) {
            Handler::Callable(value)
        } else {
            Handler::PassThrough
        }
    }

    /// PromiseResolve: promises are returned as is, anything else is
    /// wrapped in a new promise resolved with it.
    pub(crate) fn promise_resolve(&mut self, value: Value) -> Eval<ObjectId> {
        if let (true, Some(id)) = (self.is_promise(&value), value.as_object()) {
            return Ok(id);
        }
        let promise = self.new_promise();
        self.resolve_promise(promise, value)?;
        Ok(promise)
    }

    /// Suspend the running body on `value`: resume reactions go onto the
    /// promise for it and the frame records an await suspension.
    pub(crate) fn start_await(&mut self, value: Value) -> Eval<()> {
        let owner = self.resume_owner()?;
        let promise = self.promise_resolve(value)?;
        self.perform_then(promise, Handler::Resume(owner), Handler::Resume(owner), None)?;
        self.set_suspension(Suspension::Await)
    }

    /// `import(specifier)`: a pending promise settled by a queued
    /// dynamic-import job. A specifier that cannot be converted to a string
    /// rejects the promise instead of throwing.
    pub fn import_dynamic(&mut self, specifier: &Value) -> Eval<ObjectId> {
        let promise = self.new_promise();
        match self.to_js_string(specifier) {
            Ok(specifier) => {
                tracing::debug!(%specifier, promise = promise.0, "dynamic import queued");
                self.realm.jobs.enqueue(Job::DynamicImport {
                    specifier: specifier.to_string(),
                    promise,
                });
            }
            Err(Abrupt::Throw(reason)) => self.reject_promise(promise, reason),
            Err(other) => return Err(other),
        }
        Ok(promise)
    }

    fn finish_dynamic_import(&mut self, specifier: &str, promise: ObjectId) -> Eval<()> {
        match self.realm.modules.load(specifier) {
            Ok(namespace) => self.resolve_promise(promise, namespace),
            Err(error) => {
                let reason = self.create_error(error.kind, &error.message);
                self.reject_promise(promise, Value::Object(reason));
                Ok(())
            }
        }
    }

    fn execute_job(&mut self, job: Job) -> Eval<()> {
        match job {
            Job::Reaction { reaction, argument } => self.run_reaction(reaction, argument),
            Job::ResolveThenable {
                promise,
                thenable,
                then,
            } => {
                let (resolve, reject) = self.create_resolving_functions(promise);
                match self.call(&then, thenable, &[resolve, reject.clone()]) {
                    Ok(_) => Ok(()),
                    Err(Abrupt::Throw(error)) => self.call(&reject, Value::Undefined, &[error]).map(drop),
                    Err(other) => Err(other),
                }
            }
            Job::DynamicImport { specifier, promise } => self.finish_dynamic_import(&specifier, promise),
        }
    }

    fn run_reaction(&mut self, reaction: PromiseReaction, argument: Value) -> Eval<()> {
        let fulfilled = reaction.kind == ReactionKind::Fulfill;
        let outcome = match reaction.handler {
            Handler::PassThrough if fulfilled => Ok(argument),
            Handler::PassThrough => Err(argument),
            Handler::ReturnValue(value) => Ok(value),
            Handler::ThrowValue(value) => Err(value),
            Handler::Callable(function) => match self.call(&function, Value::Undefined, &[argument]) {
                Ok(value) => Ok(value),
                Err(Abrupt::Throw(error)) => Err(error),
                Err(other) => return Err(other),
            },
            Handler::Resume(owner) => {
                let completion = if fulfilled {
                    Completion::Normal(argument)
                } else {
                    Completion::Throw(argument)
                };
                return self.resume_suspended(owner, completion);
            }
            Handler::AsyncGeneratorReturn(generator) => {
                return self.async_generator_return_settled(generator, reaction.kind, argument);
            }
            Handler::Finally(on_finally) => match self.call(&on_finally, Value::Undefined, &[]) {
                Ok(result) => {
                    let promise = self.promise_resolve(result)?;
                    let passed = if fulfilled {
                        Handler::ReturnValue(argument)
                    } else {
                        Handler::ThrowValue(argument)
                    };
                    return self.perform_then(promise, passed, Handler::PassThrough, reaction.capability);
                }
                Err(Abrupt::Throw(error)) => Err(error),
                Err(other) => return Err(other),
            },
        };
        match (reaction.capability, outcome) {
            (Some(capability), Ok(value)) => self.resolve_promise(capability, value),
            (Some(capability), Err(reason)) => {
                self.reject_promise(capability, reason);
                Ok(())
            }
            (None, _) => Ok(()),
        }
    }

    /// Continue an async function or async generator after an await.
    fn resume_suspended(&mut self, owner: ObjectId, completion: Completion) -> Eval<()> {
        let object = self
            .realm
            .heap
            .get(owner)
            .ok_or_else(|| Abrupt::fatal("resume target vanished"))?;
        if object.internal::<AsyncFunctionObject>().is_some() {
            self.resume_async_function(owner, completion)
        } else if object.internal::<AsyncGeneratorObject>().is_some() {
            self.resume_async_generator(owner, completion)
        } else {
            Err(Abrupt::fatal("resume reaction on an object that cannot suspend"))
        }
    }
}

impl JobHost for Interpreter {
    type Error = Abrupt;

    fn job_queue(&mut self) -> &mut JobQueue {
        &mut self.realm.jobs
    }

    fn run_job(&mut self, job: Job) -> Result<(), Abrupt> {
        self.check_cancelled()?;
        self.execute_job(job)
    }
}

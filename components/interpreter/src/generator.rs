//! Generator objects.
//!
//! A generator owns the [`Coroutine`] of its body while it is suspended.
//! Resuming takes the coroutine out (the generator is `Executing` in the
//! meantime), runs it with the injected completion and puts it back if it
//! suspends again.

use core_types::{ObjectId, PropertyKey, Value};
use object_model::{ObjectClass, PropertyFlags, SlotValue};
use serde::Serialize;

use crate::context::{Coroutine, Suspension};
use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::resumable::Outcome;

/// Lifecycle of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeneratorState {
    /// Created, body not started
    SuspendedStart,
    /// Paused at a `yield`
    SuspendedYield,
    /// Body running
    Executing,
    /// Body finished; resumes report `done`
    Completed,
    /// Execution was cancelled while the body was running
    Abandoned,
}

#[derive(Debug)]
pub(crate) struct GeneratorObject {
    pub state: GeneratorState,
    pub coroutine: Option<Box<Coroutine>>,
}

impl Interpreter {
    pub(crate) fn create_generator(&mut self, proto: ObjectId, coroutine: Coroutine) -> ObjectId {
        let data = GeneratorObject {
            state: GeneratorState::SuspendedStart,
            coroutine: Some(Box::new(coroutine)),
        };
        self.create_object_with_proto(Some(proto), ObjectClass::Internal(Box::new(data)))
    }

    /// `{ value, done }`
    pub(crate) fn create_iter_result(&mut self, value: Value, done: bool) -> Value {
        let proto = self.realm.intrinsics.object_prototype;
        let result = self.create_object_with_proto(Some(proto), ObjectClass::Ordinary);
        let object = &mut self.realm.heap[result];
        object.add_property(
            &self.realm.shapes,
            PropertyKey::from("value"),
            SlotValue::Data(value),
            PropertyFlags::DEFAULT_DATA,
        );
        object.add_property(
            &self.realm.shapes,
            PropertyKey::from("done"),
            SlotValue::Data(Value::Boolean(done)),
            PropertyFlags::DEFAULT_DATA,
        );
        Value::Object(result)
    }

    /// State of a generator object, `None` for anything else.
    pub fn generator_state(&self, value: &Value) -> Option<GeneratorState> {
        let object = self.realm.heap.get(value.as_object()?)?;
        object.internal::<GeneratorObject>().map(|generator| generator.state)
    }

    fn generator_data(&mut self, id: ObjectId) -> Eval<&mut GeneratorObject> {
        self.realm
            .heap
            .get_mut(id)
            .and_then(|object| object.internal_mut::<GeneratorObject>())
            .ok_or_else(|| Abrupt::fatal("generator payload missing"))
    }

    fn set_generator_state(&mut self, generator: ObjectId, state: GeneratorState) {
        if let Ok(data) = self.generator_data(generator) {
            tracing::trace!(generator = generator.0, ?state, "generator state");
            data.state = state;
        }
    }

    /// `next` / `return` / `throw` on a generator object.
    pub(crate) fn generator_resume(&mut self, this: &Value, completion: Completion, method: &str) -> Eval<Value> {
        let (Some(id), Some(state)) = (this.as_object(), self.generator_state(this)) else {
            return Err(self.type_error(format!(
                "{} method called on incompatible receiver {}",
                method,
                self.describe(this)
            )));
        };
        match state {
            GeneratorState::Executing => return Err(self.type_error("Generator is already running")),
            GeneratorState::Completed | GeneratorState::Abandoned => {
                return self.finished_result(completion);
            }
            GeneratorState::SuspendedStart if !matches!(completion, Completion::Normal(_)) => {
                self.generator_data(id)?.coroutine = None;
                self.set_generator_state(id, GeneratorState::Completed);
                return self.finished_result(completion);
            }
            _ => {}
        }
        // A resume that cannot get a frame leaves the generator suspended.
        self.check_call_depth()?;
        let data = self.generator_data(id)?;
        let coroutine = data
            .coroutine
            .take()
            .ok_or_else(|| Abrupt::fatal("suspended generator without a coroutine"))?;
        data.state = GeneratorState::Executing;
        let input = (state == GeneratorState::SuspendedYield).then_some(completion);
        match self.run_coroutine(id, coroutine, input) {
            Ok(Outcome::Suspended(coroutine, Suspension::Yield(value))) => {
                self.generator_data(id)?.coroutine = Some(coroutine);
                self.set_generator_state(id, GeneratorState::SuspendedYield);
                Ok(self.create_iter_result(value, false))
            }
            Ok(Outcome::Suspended(_, Suspension::Await)) => {
                self.set_generator_state(id, GeneratorState::Completed);
                Err(Abrupt::fatal("await inside a synchronous generator"))
            }
            Ok(Outcome::Returned(value)) => {
                self.set_generator_state(id, GeneratorState::Completed);
                Ok(self.create_iter_result(value, true))
            }
            Err(abrupt @ (Abrupt::Cancelled | Abrupt::Fatal(_))) => {
                tracing::debug!(generator = id.0, "generator abandoned");
                self.set_generator_state(id, GeneratorState::Abandoned);
                Err(abrupt)
            }
            Err(abrupt) => {
                self.set_generator_state(id, GeneratorState::Completed);
                Err(abrupt)
            }
        }
    }

    fn finished_result(&mut self, completion: Completion) -> Eval<Value> {
        match completion {
            Completion::Normal(_) => Ok(self.create_iter_result(Value::Undefined, true)),
            Completion::Return(value) => Ok(self.create_iter_result(value, true)),
            Completion::Throw(error) => Err(Abrupt::Throw(error)),
        }
    }
}

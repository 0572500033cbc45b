//! The interpreter: realm, call stack and the host-facing API.

use std::rc::Rc;
use std::sync::Arc;

use async_runtime::{ModuleLoader, PromiseRecord, PromiseState, RejectionTracker};
use core_types::{ErrorKind, InternalError, JsError, JsString, ObjectId, PropertyKey, Value};
use object_model::{Heap, ObjectClass, PropertyFlags, Shape, ShapeTable, SlotValue};
use serde::Serialize;

use crate::builtins;
use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::{Abrupt, EngineError, Eval};
use crate::node::FunctionCode;
use crate::realm::{ErrorData, Realm, Tracker};
use crate::scope;

/// Point-in-time counters for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    /// Frames on the call stack above the global frame
    pub call_depth: usize,
    /// Jobs waiting in the job queue
    pub pending_jobs: usize,
    /// Objects allocated in the heap
    pub heap_objects: usize,
    /// Shapes created by the shape table
    pub shapes_created: usize,
    /// Scopes currently alive
    pub live_scopes: usize,
}

/// Tree-walking JavaScript interpreter
///
/// One interpreter owns one realm: its heap, shape table handle, global
/// scope, intrinsics and job queue. Code is built with
/// [`crate::FunctionBuilder`] and run with [`Interpreter::run`]; promise
/// jobs are drained by the host with [`Interpreter::drain_all`].
///
/// # Examples
///
/// ```
/// use interpreter::builder::*;
/// use interpreter::{FunctionBuilder, Interpreter};
/// use core_types::Value;
///
/// let mut interp = Interpreter::new();
/// let code = FunctionBuilder::script()
///     .finish(vec![
///         let_("x", Some(int(40))),
///         expr_stmt(add(ident("x"), int(2))),
///     ])
///     .unwrap();
/// assert_eq!(interp.run(&code).unwrap(), Value::Smi(42));
/// ```
pub struct Interpreter {
    pub(crate) realm: Realm,
    pub(crate) config: EngineConfig,
    /// Running frame
    pub(crate) frame: ExecutionContext,
    /// Callers of the running frame, innermost last
    pub(crate) stack: Vec<ExecutionContext>,
    cancel: CancellationToken,
}

impl Interpreter {
    /// Interpreter with the default configuration and a private shape table.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), Arc::new(ShapeTable::new()))
    }

    /// Interpreter with `config`, validated first.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_shape_table(config, Arc::new(ShapeTable::new()))
    }

    /// Interpreter sharing `shapes` with other realms.
    pub fn with_shape_table(config: EngineConfig, shapes: Arc<ShapeTable>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::build(config, shapes))
    }

    fn build(config: EngineConfig, shapes: Arc<ShapeTable>) -> Self {
        let realm = Realm::new(shapes);
        let frame = ExecutionContext::new(Value::Undefined, Rc::clone(&realm.global), config.strict);
        let mut interp = Self {
            realm,
            config,
            frame,
            stack: Vec::new(),
            cancel: CancellationToken::new(),
        };
        builtins::install(&mut interp);
        tracing::debug!(
            objects = interp.realm.heap.len(),
            shapes = interp.realm.shapes.shapes_created(),
            "realm initialized"
        );
        interp
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a script.
    ///
    /// `var`, `let`, `const` and function declarations of the script are
    /// bound in the global scope. Returns the value of the last expression
    /// statement executed.
    pub fn run(&mut self, code: &Rc<FunctionCode>) -> Result<Value, EngineError> {
        if code.kind.is_resumable() {
            return Err(EngineError::Internal(InternalError::new(
                "scripts cannot be generators or async functions",
            )));
        }
        tracing::debug!(name = %code.name, "running script");
        self.run_script(code).map_err(|abrupt| self.engine_error(abrupt))
    }

    fn run_script(&mut self, code: &Rc<FunctionCode>) -> Eval<Value> {
        let global = Rc::clone(&self.realm.global);
        let strict = code.strict || self.config.strict;
        let mut frame = ExecutionContext::new(Value::Undefined, Rc::clone(&global), strict);
        frame.completion = Some(Value::Undefined);
        self.push_frame(frame)?;
        let result = self
            .declare_script(code, &global)
            .and_then(|()| self.exec_block(&code.body));
        let frame = self.pop_frame()?;
        match result {
            Ok(()) => Ok(frame.completion.unwrap_or_default()),
            Err(Abrupt::Return(value)) => Ok(value),
            Err(Abrupt::Break(_)) | Err(Abrupt::Continue(_)) => {
                Err(Abrupt::fatal("break or continue escaped a script"))
            }
            Err(other) => Err(other),
        }
    }

    fn declare_script(&mut self, code: &Rc<FunctionCode>, global: &scope::ScopeRef) -> Eval<()> {
        for (name, _) in &code.body.lexicals {
            if global.borrow().has_own(name) {
                return Err(self.throw_error(JsError::new(
                    ErrorKind::SyntaxError,
                    format!("Identifier '{}' has already been declared", name),
                )));
            }
        }
        for name in &code.var_names {
            global.borrow_mut().declare_var(name);
        }
        self.instantiate_block(&code.body, global)
    }

    /// Push a frame for a call. Polls the cancellation token and enforces
    /// the configured call depth.
    pub(crate) fn push_frame(&mut self, frame: ExecutionContext) -> Eval<()> {
        self.check_cancelled()?;
        self.check_call_depth()?;
        let caller = std::mem::replace(&mut self.frame, frame);
        self.stack.push(caller);
        Ok(())
    }

    /// Throw the stack-overflow RangeError if one more frame would exceed
    /// the configured depth.
    pub(crate) fn check_call_depth(&mut self) -> Eval<()> {
        if self.stack.len() >= self.config.max_call_depth {
            tracing::debug!(depth = self.stack.len(), "call depth exceeded");
            return Err(self.throw_error(JsError::range_error("Maximum call stack size exceeded")));
        }
        Ok(())
    }

    /// Pop the running frame, returning it.
    pub(crate) fn pop_frame(&mut self) -> Eval<ExecutionContext> {
        let caller = self
            .stack
            .pop()
            .ok_or_else(|| Abrupt::fatal("call stack underflow"))?;
        Ok(std::mem::replace(&mut self.frame, caller))
    }

    /// Raise the cancellation signal if the token fired.
    pub(crate) fn check_cancelled(&self) -> Eval<()> {
        if self.cancel.is_cancelled() {
            Err(Abrupt::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Token that stops this interpreter when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current counters.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            call_depth: self.stack.len(),
            pending_jobs: self.realm.jobs.len(),
            heap_objects: self.realm.heap.len(),
            shapes_created: self.realm.shapes.shapes_created(),
            live_scopes: self.realm.live_scopes(),
        }
    }

    /// The object heap.
    pub fn heap(&self) -> &Heap {
        &self.realm.heap
    }

    /// The shape table used by this realm.
    pub fn shape_table(&self) -> &Arc<ShapeTable> {
        &self.realm.shapes
    }

    /// Value of a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        scope::lookup(&self.realm.global, name).ok()
    }

    /// Create or overwrite a global `var` binding.
    pub fn set_global(&mut self, name: &str, value: Value) {
        let name: JsString = Arc::from(name);
        self.realm
            .global
            .borrow_mut()
            .declare(&name, crate::node::DeclKind::Var, value);
    }

    /// Allocate an object laid out by `shape`.
    pub fn create_object_with_shape(&mut self, shape: Arc<Shape>, class: ObjectClass) -> ObjectId {
        self.realm.heap.create_object_with_shape(shape, class)
    }

    /// Allocate an empty ordinary object inheriting from `Object.prototype`.
    pub fn create_object(&mut self) -> ObjectId {
        let proto = self.realm.intrinsics.object_prototype;
        self.create_object_with_proto(Some(proto), ObjectClass::Ordinary)
    }

    /// Allocate an array holding `elements`.
    pub fn create_array(&mut self, elements: Vec<Value>) -> ObjectId {
        let proto = self.realm.intrinsics.array_prototype;
        self.create_object_with_proto(Some(proto), ObjectClass::Array(elements.into()))
    }

    pub(crate) fn create_object_with_proto(&mut self, proto: Option<ObjectId>, class: ObjectClass) -> ObjectId {
        let shape = self.realm.shapes.root(proto);
        self.realm.heap.create_object_with_shape(shape, class)
    }

    /// State and result of a promise, `None` for non-promises.
    pub fn promise_state(&self, value: &Value) -> Option<(PromiseState, Value)> {
        let record = value
            .as_object()
            .and_then(|id| self.realm.heap.get(id))
            .and_then(|object| object.internal::<PromiseRecord>())?;
        Some((record.state(), record.result().clone()))
    }

    /// Read `value` and `done` of an iterator result object.
    pub fn iter_result(&mut self, result: &Value) -> Eval<(Value, bool)> {
        let value = self.get_property(result, &PropertyKey::from("value"))?;
        let done = self.get_property(result, &PropertyKey::from("done"))?;
        Ok((value, done.is_truthy()))
    }

    /// Replace the rejection tracker.
    pub fn set_rejection_tracker(&mut self, tracker: Box<dyn RejectionTracker>) {
        self.realm.tracker = Tracker::Custom(tracker);
    }

    /// Replace the loader that resolves `import()` specifiers. The default
    /// loader knows no modules, so every import rejects.
    pub fn set_module_loader(&mut self, loader: Box<dyn ModuleLoader>) {
        self.realm.modules = loader;
    }

    /// Rejected promises that never got a handler, as seen by the default
    /// tracker. Empty once a custom tracker is installed.
    pub fn unhandled_rejections(&self) -> Vec<ObjectId> {
        self.realm.tracker.unhandled()
    }

    /// Drain one job from the job queue.
    pub fn drain_one_job(&mut self) -> Result<bool, EngineError> {
        async_runtime::drain_one_job(self).map_err(|abrupt| self.engine_error(abrupt))
    }

    /// Drain the job queue until it is empty. Returns the number of jobs run.
    pub fn drain_all(&mut self) -> Result<usize, EngineError> {
        async_runtime::drain_all(self).map_err(|abrupt| self.engine_error(abrupt))
    }

    /// Allocate an error object of `kind`.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> ObjectId {
        let proto = self.realm.intrinsics.error_prototype(kind);
        let error = self.create_object_with_proto(
            Some(proto),
            ObjectClass::Internal(Box::new(ErrorData { kind })),
        );
        let flags = PropertyFlags::WRITABLE | PropertyFlags::CONFIGURABLE;
        self.realm.heap[error].add_property(
            &self.realm.shapes,
            PropertyKey::from("message"),
            SlotValue::Data(Value::string(message)),
            flags,
        );
        error
    }

    /// Turn an engine-side error into a thrown error object.
    pub(crate) fn throw_error(&mut self, error: JsError) -> Abrupt {
        let object = self.create_error(error.kind, &error.message);
        Abrupt::Throw(Value::Object(object))
    }

    /// Throw a `TypeError` with `message`.
    pub(crate) fn type_error(&mut self, message: impl Into<String>) -> Abrupt {
        self.throw_error(JsError::type_error(message))
    }

    /// Convert an abrupt completion that reached the host.
    pub fn engine_error(&self, abrupt: Abrupt) -> EngineError {
        match abrupt {
            Abrupt::Throw(value) => {
                let (kind, message) = self.describe_exception(&value);
                tracing::debug!(%kind, %message, "uncaught exception");
                EngineError::Uncaught { kind, message }
            }
            Abrupt::Cancelled => EngineError::Cancelled,
            Abrupt::Fatal(error) => EngineError::Internal(error),
            other => EngineError::Internal(InternalError::new(format!(
                "unexpected completion at top level: {:?}",
                other
            ))),
        }
    }

    fn describe_exception(&self, value: &Value) -> (ErrorKind, String) {
        let error = value
            .as_object()
            .and_then(|id| self.realm.heap.get(id))
            .and_then(|object| {
                let data = object.internal::<ErrorData>()?;
                let message = object
                    .own_property(&PropertyKey::from("message"))
                    .and_then(|(_, slot)| slot.as_data().cloned())
                    .unwrap_or_default();
                Some((data.kind, message.to_string()))
            });
        error.unwrap_or_else(|| (ErrorKind::Error, value.to_string()))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

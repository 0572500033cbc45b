//! Function objects, calls and construction.
//!
//! A function object is a heap object of class `Function` whose payload is
//! a [`Callable`]. Script closures capture their defining scope; native
//! functions are plain Rust function pointers with an optional data value.

use std::cell::Cell;
use std::rc::Rc;

use core_types::{JsString, ObjectId, PropertyKey, Value};
use object_model::{ObjectClass, PropertyFlags, SlotValue};

use crate::context::{Coroutine, ExecutionContext};
use crate::error::{Abrupt, Eval};
use crate::interpreter::Interpreter;
use crate::node::{Block, DeclKind, FunctionCode, FunctionKind, Stmt};
use crate::scope::{Scope, ScopeRef};

/// Signature of native functions.
pub type NativeFn = fn(&mut Interpreter, &CallArgs<'_>) -> Eval<Value>;

/// Arguments of a native call.
#[derive(Debug)]
pub struct CallArgs<'a> {
    /// `this` value (`undefined` for construct calls)
    pub this: Value,
    /// Positional arguments
    pub args: &'a [Value],
    /// Data value the function was created with
    pub data: &'a Value,
    /// The constructor being invoked, for `new`
    pub new_target: Option<ObjectId>,
}

impl CallArgs<'_> {
    /// Argument `index`, `undefined` when absent.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

/// Payload of function objects.
#[derive(Clone)]
pub(crate) enum Callable {
    /// Closure over script code
    Script {
        code: Rc<FunctionCode>,
        scope: ScopeRef,
        /// Lexical `this` of arrow functions
        this_value: Option<Value>,
    },
    /// Built-in function
    Native {
        call: NativeFn,
        construct: Option<NativeFn>,
        data: Value,
    },
    /// Promise resolve/reject function
    Resolving {
        promise: ObjectId,
        reject: bool,
        already_resolved: Rc<Cell<bool>>,
    },
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Script { code, .. } => write!(f, "Script({})", code.name),
            Callable::Native { .. } => f.write_str("Native"),
            Callable::Resolving { promise, reject, .. } => {
                write!(f, "Resolving(promise={}, reject={})", promise.0, reject)
            }
        }
    }
}

impl Interpreter {
    pub(crate) fn create_function_object(&mut self, callable: Callable) -> ObjectId {
        let proto = self.realm.intrinsics.function_prototype;
        self.create_object_with_proto(Some(proto), ObjectClass::Function(Box::new(callable)))
    }

    /// Create a native function object.
    pub fn create_native_function(&mut self, name: &str, length: u32, call: NativeFn) -> ObjectId {
        self.create_native(name, length, call, None, Value::Undefined)
    }

    pub(crate) fn create_native(
        &mut self,
        name: &str,
        length: u32,
        call: NativeFn,
        construct: Option<NativeFn>,
        data: Value,
    ) -> ObjectId {
        let id = self.create_function_object(Callable::Native {
            call,
            construct,
            data,
        });
        self.define_function_metadata(id, name, length);
        id
    }

    fn define_function_metadata(&mut self, id: ObjectId, name: &str, length: u32) {
        let object = &mut self.realm.heap[id];
        let shapes = &self.realm.shapes;
        object.add_property(
            shapes,
            PropertyKey::from("length"),
            SlotValue::Data(Value::Smi(length as i32)),
            PropertyFlags::CONFIGURABLE,
        );
        object.add_property(
            shapes,
            PropertyKey::from("name"),
            SlotValue::Data(Value::string(name)),
            PropertyFlags::CONFIGURABLE,
        );
    }

    /// Closure for `code` capturing `scope`.
    pub(crate) fn create_closure(&mut self, code: &Rc<FunctionCode>, scope: ScopeRef) -> ObjectId {
        let this_value = code.is_arrow.then(|| self.frame.this_value.clone());
        let id = self.create_function_object(Callable::Script {
            code: Rc::clone(code),
            scope,
            this_value,
        });
        self.define_function_metadata(id, &code.name, code.params.len() as u32);
        let prototype = match code.kind {
            _ if code.is_arrow => None,
            FunctionKind::Normal => {
                let prototype = self.create_object();
                self.realm.heap[prototype].add_property(
                    &self.realm.shapes,
                    PropertyKey::from("constructor"),
                    SlotValue::Data(Value::Object(id)),
                    PropertyFlags::WRITABLE | PropertyFlags::CONFIGURABLE,
                );
                Some(prototype)
            }
            FunctionKind::Generator => {
                let proto = self.realm.intrinsics.generator_prototype;
                Some(self.create_object_with_proto(Some(proto), ObjectClass::Ordinary))
            }
            FunctionKind::AsyncGenerator => {
                let proto = self.realm.intrinsics.async_generator_prototype;
                Some(self.create_object_with_proto(Some(proto), ObjectClass::Ordinary))
            }
            FunctionKind::Async => None,
        };
        if let Some(prototype) = prototype {
            self.realm.heap[id].add_property(
                &self.realm.shapes,
                PropertyKey::from("prototype"),
                SlotValue::Data(Value::Object(prototype)),
                PropertyFlags::WRITABLE,
            );
        }
        tracing::trace!(name = %code.name, kind = ?code.kind, "closure created");
        id
    }

    /// Bind `let`/`const` names and hoist function declarations of `block`
    /// into `scope`.
    pub(crate) fn instantiate_block(&mut self, block: &Block, scope: &ScopeRef) -> Eval<()> {
        for (name, kind) in &block.lexicals {
            scope.borrow_mut().declare(name, *kind, Value::Undefined);
        }
        for stmt in &block.body {
            if let Stmt::FunctionDeclaration { name, code } = stmt {
                let closure = self.create_closure(code, Rc::clone(scope));
                scope
                    .borrow_mut()
                    .declare(name, DeclKind::Var, Value::Object(closure));
            }
        }
        Ok(())
    }

    /// Scope for one call: parameters, hoisted `var`s, lexicals and
    /// function declarations of the body.
    fn function_scope(&mut self, code: &Rc<FunctionCode>, closure: &ScopeRef, args: &[Value]) -> Eval<ScopeRef> {
        let scope = Scope::new(Some(Rc::clone(closure)), &self.realm.live);
        {
            let mut inner = scope.borrow_mut();
            for (index, param) in code.params.iter().enumerate() {
                let value = args.get(index).cloned().unwrap_or_default();
                inner.declare(param, DeclKind::Var, value);
            }
            for name in &code.var_names {
                inner.declare_var(name);
            }
        }
        self.instantiate_block(&code.body, &scope)?;
        Ok(scope)
    }

    fn callable_of(&self, value: &Value) -> Option<(ObjectId, Callable)> {
        let id = value.as_object()?;
        let callable = self.realm.heap.get(id)?.function::<Callable>()?.clone();
        Some((id, callable))
    }

    /// Call `callee` with `this` and `args`.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> Eval<Value> {
        self.check_cancelled()?;
        let Some((id, callable)) = self.callable_of(callee) else {
            return Err(self.type_error(format!("{} is not a function", self.describe(callee))));
        };
        match callable {
            Callable::Native { call, data, .. } => call(
                self,
                &CallArgs {
                    this,
                    args,
                    data: &data,
                    new_target: None,
                },
            ),
            Callable::Resolving {
                promise,
                reject,
                already_resolved,
            } => {
                if already_resolved.replace(true) {
                    return Ok(Value::Undefined);
                }
                let value = args.first().cloned().unwrap_or_default();
                if reject {
                    self.reject_promise(promise, value);
                } else {
                    self.resolve_promise(promise, value)?;
                }
                Ok(Value::Undefined)
            }
            Callable::Script {
                code,
                scope,
                this_value,
            } => {
                let this = this_value.unwrap_or(this);
                self.call_script(id, &code, &scope, this, args)
            }
        }
    }

    fn call_script(
        &mut self,
        function: ObjectId,
        code: &Rc<FunctionCode>,
        closure: &ScopeRef,
        this: Value,
        args: &[Value],
    ) -> Eval<Value> {
        let strict = code.strict || self.config.strict;
        let scope = self.function_scope(code, closure, args)?;
        match code.kind {
            FunctionKind::Normal => {
                self.push_frame(ExecutionContext::new(this, scope, strict))?;
                let result = self.exec_block(&code.body);
                self.pop_frame()?;
                match result {
                    Ok(()) => Ok(Value::Undefined),
                    Err(Abrupt::Return(value)) => Ok(value),
                    Err(Abrupt::Break(_)) | Err(Abrupt::Continue(_)) => {
                        Err(Abrupt::fatal("break or continue escaped a function body"))
                    }
                    Err(other) => Err(other),
                }
            }
            FunctionKind::Generator => {
                let coroutine = Coroutine::new(Rc::clone(code), this, scope, strict);
                let proto = self.instance_prototype(function, self.realm.intrinsics.generator_prototype)?;
                Ok(Value::Object(self.create_generator(proto, coroutine)))
            }
            FunctionKind::Async => {
                let coroutine = Coroutine::new(Rc::clone(code), this, scope, strict);
                self.start_async_function(coroutine)
            }
            FunctionKind::AsyncGenerator => {
                let coroutine = Coroutine::new(Rc::clone(code), this, scope, strict);
                let proto =
                    self.instance_prototype(function, self.realm.intrinsics.async_generator_prototype)?;
                Ok(Value::Object(self.create_async_generator(proto, coroutine)))
            }
        }
    }

    /// The constructor's `prototype` property, or `fallback` when it is not
    /// an object.
    fn instance_prototype(&mut self, constructor: ObjectId, fallback: ObjectId) -> Eval<ObjectId> {
        let prototype = self.get_property(&Value::Object(constructor), &PropertyKey::from("prototype"))?;
        Ok(prototype.as_object().unwrap_or(fallback))
    }

    /// `new callee(...args)`.
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> Eval<Value> {
        self.check_cancelled()?;
        let not_constructor = |interp: &mut Self| {
            let name = interp.describe(callee);
            interp.type_error(format!("{} is not a constructor", name))
        };
        let Some((id, callable)) = self.callable_of(callee) else {
            return Err(not_constructor(self));
        };
        match callable {
            Callable::Native {
                construct: Some(construct),
                data,
                ..
            } => construct(
                self,
                &CallArgs {
                    this: Value::Undefined,
                    args,
                    data: &data,
                    new_target: Some(id),
                },
            ),
            Callable::Script { code, scope, .. }
                if code.kind == FunctionKind::Normal && !code.is_arrow =>
            {
                let object_prototype = self.realm.intrinsics.object_prototype;
                let proto = self.instance_prototype(id, object_prototype)?;
                let object = self.create_object_with_proto(Some(proto), ObjectClass::Ordinary);
                let result = self.call_script(id, &code, &scope, Value::Object(object), args)?;
                Ok(match result {
                    Value::Object(_) => result,
                    _ => Value::Object(object),
                })
            }
            _ => Err(not_constructor(self)),
        }
    }

    /// Name of a function object, for messages.
    pub(crate) fn function_name(&self, function: &Value) -> Option<JsString> {
        let object = self.realm.heap.get(function.as_object()?)?;
        match object.own_property(&PropertyKey::from("name"))?.1 {
            SlotValue::Data(Value::String(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

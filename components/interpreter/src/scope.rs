//! Lexical scopes.
//!
//! A scope is a map of bindings plus a link to its parent. Scopes are shared
//! between the running frame, closures and suspended generator state, so
//! they are reference counted. Each scope also holds a clone of the realm's
//! liveness token; the token's strong count is the number of scopes alive.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use core_types::{JsError, JsString, Value};
use rustc_hash::FxHashMap;

use crate::node::DeclKind;

/// Shared handle to a scope.
pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
    initialized: bool,
}

/// One lexical environment.
#[derive(Debug)]
pub(crate) struct Scope {
    bindings: FxHashMap<JsString, Binding>,
    parent: Option<ScopeRef>,
    _live: Rc<()>,
}

impl Scope {
    /// A new empty scope below `parent`.
    pub(crate) fn new(parent: Option<ScopeRef>, live: &Rc<()>) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent,
            _live: Rc::clone(live),
        }))
    }

    /// Copy of `scope` with the same parent and the current binding values.
    /// Used for per-iteration `for (let ...)` environments.
    pub(crate) fn copy(scope: &ScopeRef) -> ScopeRef {
        let inner = scope.borrow();
        Rc::new(RefCell::new(Scope {
            bindings: inner.bindings.clone(),
            parent: inner.parent.clone(),
            _live: Rc::clone(&inner._live),
        }))
    }

    /// Create a binding. `let`/`const` start uninitialized (temporal dead
    /// zone), everything else starts as `value`.
    pub(crate) fn declare(&mut self, name: &JsString, kind: DeclKind, value: Value) {
        let binding = match kind {
            DeclKind::Var => Binding {
                value,
                mutable: true,
                initialized: true,
            },
            DeclKind::Let => Binding {
                value: Value::Undefined,
                mutable: true,
                initialized: false,
            },
            DeclKind::Const => Binding {
                value: Value::Undefined,
                mutable: false,
                initialized: false,
            },
        };
        self.bindings.insert(Arc::clone(name), binding);
    }

    /// Declare a `var` unless the name already exists in this scope.
    pub(crate) fn declare_var(&mut self, name: &JsString) {
        if !self.bindings.contains_key(name) {
            self.declare(name, DeclKind::Var, Value::Undefined);
        }
    }

    /// Whether this scope (not its parents) binds `name`.
    pub(crate) fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Initialize a `let`/`const` binding when its declaration runs.
    /// Creates the binding if the declaration was not hoisted.
    pub(crate) fn initialize(&mut self, name: &JsString, kind: DeclKind, value: Value) {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                binding.initialized = true;
            }
            None => {
                self.bindings.insert(
                    Arc::clone(name),
                    Binding {
                        value,
                        mutable: kind != DeclKind::Const,
                        initialized: true,
                    },
                );
            }
        }
    }
}

/// Resolve `name` through the scope chain.
pub(crate) fn lookup(scope: &ScopeRef, name: &str) -> Result<Value, JsError> {
    let mut current = Rc::clone(scope);
    loop {
        let parent = {
            let inner = current.borrow();
            if let Some(binding) = inner.bindings.get(name) {
                if !binding.initialized {
                    return Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )));
                }
                return Ok(binding.value.clone());
            }
            inner.parent.clone()
        };
        match parent {
            Some(parent) => current = parent,
            None => {
                return Err(JsError::reference_error(format!("{} is not defined", name)));
            }
        }
    }
}

/// Whether `name` resolves anywhere in the chain.
pub(crate) fn is_bound(scope: &ScopeRef, name: &str) -> bool {
    let mut current = Some(Rc::clone(scope));
    while let Some(scope) = current {
        let inner = scope.borrow();
        if inner.bindings.contains_key(name) {
            return true;
        }
        current = inner.parent.clone();
    }
    false
}

/// Outcome of an assignment through the scope chain.
#[derive(Debug, PartialEq)]
pub(crate) enum Assigned {
    /// An existing binding was updated
    Updated,
    /// No binding exists; the caller decides (global in sloppy mode,
    /// ReferenceError in strict mode)
    Unresolved,
}

/// Assign to an existing binding.
pub(crate) fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<Assigned, JsError> {
    let mut current = Rc::clone(scope);
    loop {
        let parent = {
            let mut inner = current.borrow_mut();
            if let Some(binding) = inner.bindings.get_mut(name) {
                if !binding.initialized {
                    return Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )));
                }
                if !binding.mutable {
                    return Err(JsError::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(Assigned::Updated);
            }
            inner.parent.clone()
        };
        match parent {
            Some(parent) => current = parent,
            None => return Ok(Assigned::Unresolved),
        }
    }
}

/// Root of the chain (the global scope).
pub(crate) fn root(scope: &ScopeRef) -> ScopeRef {
    let mut current = Rc::clone(scope);
    loop {
        let parent = current.borrow().parent.clone();
        match parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

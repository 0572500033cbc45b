//! Expression evaluation.
//!
//! [`Interpreter::eval_value`] is the generic entry point. The typed entry
//! points (`eval_int`, `eval_double`, `eval_boolean`, `eval_void`) let
//! parents that know what they need skip boxing: integer arithmetic stays
//! on `i32` until it overflows, conditions skip building a boolean value.

use std::rc::Rc;
use std::sync::Arc;

use core_types::{JsError, JsString, PropertyKey, Value};
use object_model::{PropertyFlags, SlotValue};

use crate::context::Suspension;
use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::node::{
    AssignTarget, BinaryOp, Expr, FunctionKind, Literal, LogicalOp, ObjectProperty, Slot, UnaryOp,
    UpdateOp,
};
use crate::operations::{smi_binary, smi_mul};
use crate::property::key_value;
use crate::resumable::{AsyncYieldPhase, NodeState};
use crate::scope::{self, Assigned};

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Int(n) => Value::Smi(*n),
        Literal::Double(n) => Value::Double(*n),
        Literal::String(s) => Value::String(Arc::clone(s)),
    }
}

fn int_result(value: Value) -> Result<i32, Value> {
    match value {
        Value::Smi(n) => Ok(n),
        other => Err(other),
    }
}

/// Source-like name of a callee, for "is not a function" messages.
fn callee_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name) => name.to_string(),
        Expr::This => "this".to_string(),
        Expr::Member { object, key, .. } => format!("{}.{}", callee_name(object), key),
        Expr::Element { object, .. } => format!("{}[...]", callee_name(object)),
        _ => "(intermediate value)".to_string(),
    }
}

impl Interpreter {
    /// Evaluate `expr` to a value.
    pub fn eval_value(&mut self, expr: &Expr) -> Eval<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(name) => self.read_binding(name),
            Expr::This => Ok(self.frame.this_value.clone()),
            Expr::Assign {
                target,
                value,
                slot,
            } => self.eval_assign(target, value, *slot),
            Expr::CompoundAssign {
                op,
                target,
                value,
                slot,
            } => self.eval_compound(*op, target, value, *slot),
            Expr::Binary {
                op,
                left,
                right,
                slot,
            } => {
                let (l, r) = self.eval_pair(*slot, left, right)?;
                self.binary_op(*op, &l, &r)
            }
            Expr::Logical {
                op,
                left,
                right,
                slot,
            } => self.eval_logical(*op, left, right, *slot),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Update { op, prefix, name } => self.eval_update(*op, *prefix, name),
            Expr::Conditional {
                test,
                consequent,
                alternate,
                slot,
            } => {
                let branch = match self.take_state(*slot) {
                    Some(NodeState::Branch(branch)) => branch,
                    _ => self.eval_boolean(test)?,
                };
                let chosen = if branch { consequent } else { alternate };
                match self.eval_value(chosen) {
                    Err(Abrupt::Suspend) => Err(self.suspend_with(*slot, NodeState::Branch(branch))),
                    result => result,
                }
            }
            Expr::Member { object, key, cache } => {
                let receiver = self.eval_value(object)?;
                self.cached_get(&receiver, key, cache)
            }
            Expr::Element { object, key, slot } => {
                let (receiver, key) = self.eval_pair(*slot, object, key)?;
                self.get_element(&receiver, &key)
            }
            Expr::In {
                key,
                object,
                cache,
                slot,
            } => {
                let (key, object) = self.eval_pair(*slot, key, object)?;
                if object.as_object().is_none() {
                    return Err(self.type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, object
                    )));
                }
                let key = self.to_property_key(&key)?;
                let found = match cache {
                    Some(cache) => self.cached_has(&object, &key, cache)?,
                    None => self.has_property(&object, &key)?,
                };
                Ok(Value::Boolean(found))
            }
            Expr::Delete { object, key, slot } => {
                let (object, key) = self.eval_pair(*slot, object, key)?;
                let key = self.to_property_key(&key)?;
                let deleted = self.delete_property(&object, &key)?;
                if !deleted && self.frame.strict {
                    return Err(self.type_error(format!(
                        "Cannot delete property '{}' of {}",
                        key,
                        self.describe(&object)
                    )));
                }
                Ok(Value::Boolean(deleted))
            }
            Expr::Call { callee, args, slot } => self.eval_call(callee, args, *slot),
            Expr::New { callee, args, slot } => {
                let mut exprs: Vec<&Expr> = Vec::with_capacity(args.len() + 1);
                exprs.push(callee);
                exprs.extend(args.iter());
                let mut values = self.eval_operands(*slot, &exprs)?;
                let constructor = values.remove(0);
                if !self.is_callable(&constructor) {
                    return Err(self.type_error(format!("{} is not a constructor", callee_name(callee))));
                }
                self.construct(&constructor, &values)
            }
            Expr::Object { properties, slot } => self.eval_object(properties, *slot),
            Expr::Array { elements, slot } => self.eval_array(elements, *slot),
            Expr::Function(code) => {
                let scope = Rc::clone(&self.frame.scope);
                Ok(Value::Object(self.create_closure(code, scope)))
            }
            Expr::Yield { operand, slot } => self.eval_yield(operand.as_deref(), *slot),
            Expr::YieldStar { operand, slot } => self.eval_yield_star(operand, *slot),
            Expr::Await { operand, slot } => self.eval_await(operand, *slot),
            Expr::Import { specifier } => {
                let specifier = self.eval_value(specifier)?;
                Ok(Value::Object(self.import_dynamic(&specifier)?))
            }
            Expr::Sequence { exprs, slot } => self.eval_sequence(exprs, *slot),
        }
    }

    /// Evaluate `expr` expecting a 32-bit integer. Any other result, such as
    /// an overflowed sum or a string, comes back as `Err(value)`.
    pub fn eval_int(&mut self, expr: &Expr) -> Eval<Result<i32, Value>> {
        match expr {
            Expr::Literal(Literal::Int(n)) => Ok(Ok(*n)),
            Expr::Binary {
                op: op @ (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul),
                left,
                right,
                slot: None,
            } => {
                let l = self.eval_int(left)?;
                let r = self.eval_int(right)?;
                if let (Ok(a), Ok(b)) = (&l, &r) {
                    let fast = match op {
                        BinaryOp::Add => a.checked_add(*b),
                        BinaryOp::Sub => a.checked_sub(*b),
                        _ => smi_mul(*a, *b),
                    };
                    if let Some(n) = fast {
                        return Ok(Ok(n));
                    }
                }
                let l = l.map_or_else(|value| value, Value::Smi);
                let r = r.map_or_else(|value| value, Value::Smi);
                Ok(int_result(self.binary_op(*op, &l, &r)?))
            }
            _ => Ok(int_result(self.eval_value(expr)?)),
        }
    }

    /// Evaluate `expr` expecting a number. Non-numbers come back as
    /// `Err(value)`.
    pub fn eval_double(&mut self, expr: &Expr) -> Eval<Result<f64, Value>> {
        let value = self.eval_value(expr)?;
        Ok(match value.as_number() {
            Some(n) => Ok(n),
            None => Err(value),
        })
    }

    /// Evaluate `expr` for its truthiness.
    pub fn eval_boolean(&mut self, expr: &Expr) -> Eval<bool> {
        match expr {
            Expr::Literal(Literal::Boolean(b)) => Ok(*b),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(!self.eval_boolean(operand)?),
            Expr::Binary {
                op,
                left,
                right,
                slot: None,
            } if is_comparison(*op) => {
                let l = self.eval_int(left)?;
                let r = self.eval_int(right)?;
                if let (Ok(a), Ok(b)) = (&l, &r) {
                    if let Some(Value::Boolean(result)) = smi_binary(*op, *a, *b) {
                        return Ok(result);
                    }
                }
                let l = l.map_or_else(|value| value, Value::Smi);
                let r = r.map_or_else(|value| value, Value::Smi);
                Ok(self.binary_op(*op, &l, &r)?.is_truthy())
            }
            _ => Ok(self.eval_value(expr)?.is_truthy()),
        }
    }

    /// Evaluate `expr` for its side effects.
    pub fn eval_void(&mut self, expr: &Expr) -> Eval<()> {
        match expr {
            Expr::Update { op, name, .. } => self.eval_update(*op, true, name).map(drop),
            _ => self.eval_value(expr).map(drop),
        }
    }

    pub(crate) fn read_binding(&mut self, name: &str) -> Eval<Value> {
        scope::lookup(&self.frame.scope, name).map_err(|error| self.throw_error(error))
    }

    pub(crate) fn write_binding(&mut self, name: &JsString, value: Value) -> Eval<()> {
        match scope::assign(&self.frame.scope, name, value.clone()) {
            Ok(Assigned::Updated) => Ok(()),
            Ok(Assigned::Unresolved) if self.frame.strict => {
                Err(self.throw_error(JsError::reference_error(format!("{} is not defined", name))))
            }
            Ok(Assigned::Unresolved) => {
                self.realm
                    .global
                    .borrow_mut()
                    .declare(name, crate::node::DeclKind::Var, value);
                Ok(())
            }
            Err(error) => Err(self.throw_error(error)),
        }
    }

    /// Two operands, saving the first when the second suspends.
    fn eval_pair(&mut self, slot: Slot, first: &Expr, second: &Expr) -> Eval<(Value, Value)> {
        if slot.is_none() {
            let a = self.eval_value(first)?;
            let b = self.eval_value(second)?;
            return Ok((a, b));
        }
        let mut values = self.eval_operands(slot, &[first, second])?.into_iter();
        let a = values.next().unwrap_or_default();
        let b = values.next().unwrap_or_default();
        Ok((a, b))
    }

    fn eval_logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr, slot: Slot) -> Eval<Value> {
        if !matches!(self.take_state(slot), Some(NodeState::Right)) {
            let value = self.eval_value(left)?;
            let short_circuit = match op {
                LogicalOp::And => !value.is_truthy(),
                LogicalOp::Or => value.is_truthy(),
                LogicalOp::Coalesce => !value.is_nullish(),
            };
            if short_circuit {
                return Ok(value);
            }
        }
        match self.eval_value(right) {
            Err(Abrupt::Suspend) => Err(self.suspend_with(slot, NodeState::Right)),
            result => result,
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Eval<Value> {
        if op == UnaryOp::TypeOf {
            if let Expr::Identifier(name) = operand {
                if !scope::is_bound(&self.frame.scope, name) {
                    return Ok(Value::string("undefined"));
                }
            }
            let value = self.eval_value(operand)?;
            return Ok(Value::string(self.type_of(&value)));
        }
        if op == UnaryOp::Not {
            return Ok(Value::Boolean(!self.eval_boolean(operand)?));
        }
        let value = self.eval_value(operand)?;
        match op {
            UnaryOp::Neg => match value {
                Value::Smi(n) if n != 0 && n != i32::MIN => Ok(Value::Smi(-n)),
                other => Ok(Value::number(-self.to_number(&other)?)),
            },
            UnaryOp::Plus => Ok(Value::number(self.to_number(&value)?)),
            UnaryOp::BitNot => Ok(Value::Smi(!self.to_int32(&value)?)),
            _ => Ok(Value::Undefined),
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, name: &JsString) -> Eval<Value> {
        let old = self.read_binding(name)?;
        let (old, new) = match (old, op) {
            (Value::Smi(n), UpdateOp::Increment) if n < i32::MAX => (Value::Smi(n), Value::Smi(n + 1)),
            (Value::Smi(n), UpdateOp::Decrement) if n > i32::MIN => (Value::Smi(n), Value::Smi(n - 1)),
            (other, op) => {
                let n = self.to_number(&other)?;
                let delta = if op == UpdateOp::Increment { 1.0 } else { -1.0 };
                (Value::number(n), Value::number(n + delta))
            }
        };
        self.write_binding(name, new.clone())?;
        Ok(if prefix { new } else { old })
    }

    fn eval_assign(&mut self, target: &AssignTarget, value: &Expr, slot: Slot) -> Eval<Value> {
        match target {
            AssignTarget::Identifier(name) => {
                let value = self.eval_value(value)?;
                self.write_binding(name, value.clone())?;
                Ok(value)
            }
            AssignTarget::Member { object, key, cache } => {
                let (base, value) = self.eval_pair(slot, object, value)?;
                self.cached_set(&base, key, value.clone(), cache)?;
                Ok(value)
            }
            AssignTarget::Element { object, key } => {
                let mut values = self.eval_operands(slot, &[&**object, &**key, value])?.into_iter();
                let base = values.next().unwrap_or_default();
                let key = values.next().unwrap_or_default();
                let value = values.next().unwrap_or_default();
                self.set_element(&base, &key, value.clone())?;
                Ok(value)
            }
        }
    }

    /// `target op= value`.
    ///
    /// For element targets the base is checked for `null`/`undefined` before
    /// the right-hand side runs, so `a[i] += f()` with a nullish `a` throws
    /// without calling `f`.
    fn eval_compound(&mut self, op: BinaryOp, target: &AssignTarget, value: &Expr, slot: Slot) -> Eval<Value> {
        let state = self.take_state(slot);
        match target {
            AssignTarget::Identifier(name) => {
                let old = match state {
                    Some(NodeState::CompoundIdent { old }) => old,
                    _ => self.read_binding(name)?,
                };
                let rhs = match self.eval_value(value) {
                    Err(Abrupt::Suspend) => {
                        return Err(self.suspend_with(slot, NodeState::CompoundIdent { old }))
                    }
                    result => result?,
                };
                let result = self.binary_op(op, &old, &rhs)?;
                self.write_binding(name, result.clone())?;
                Ok(result)
            }
            AssignTarget::Member { object, key, cache } => {
                let (base, old) = match state {
                    Some(NodeState::Compound { base, old, .. }) => (base, old),
                    _ => {
                        let base = self.eval_value(object)?;
                        let old = self.get_property(&base, key)?;
                        (base, old)
                    }
                };
                let rhs = match self.eval_value(value) {
                    Err(Abrupt::Suspend) => {
                        let state = NodeState::Compound {
                            base,
                            key: key_value(key),
                            old,
                        };
                        return Err(self.suspend_with(slot, state));
                    }
                    result => result?,
                };
                let result = self.binary_op(op, &old, &rhs)?;
                self.cached_set(&base, key, result.clone(), cache)?;
                Ok(result)
            }
            AssignTarget::Element { object, key } => {
                let (base, key, old) = match state {
                    Some(NodeState::Compound { base, key, old }) => (base, key, old),
                    other => {
                        if let Some(partial) = other {
                            self.put_state(slot, partial);
                        }
                        let (base, key) = self.eval_pair(slot, object, key)?;
                        if base.is_nullish() {
                            return Err(self.type_error(format!(
                                "Cannot set property '{}' of {}",
                                key, base
                            )));
                        }
                        let key = key_value(&self.to_property_key(&key)?);
                        let old = self.get_element(&base, &key)?;
                        (base, key, old)
                    }
                };
                let rhs = match self.eval_value(value) {
                    Err(Abrupt::Suspend) => {
                        return Err(self.suspend_with(slot, NodeState::Compound { base, key, old }))
                    }
                    result => result?,
                };
                let result = self.binary_op(op, &old, &rhs)?;
                self.set_element(&base, &key, result.clone())?;
                Ok(result)
            }
        }
    }

    /// Callee and `this` for a call expression.
    fn eval_callee(&mut self, callee: &Expr) -> Eval<(Value, Value)> {
        match callee {
            Expr::Member { object, key, cache } => {
                let this = self.eval_value(object)?;
                let function = self.cached_get(&this, key, cache)?;
                Ok((this, function))
            }
            Expr::Element { object, key, slot } => {
                let (this, key) = self.eval_pair(*slot, object, key)?;
                let function = self.get_element(&this, &key)?;
                Ok((this, function))
            }
            other => Ok((Value::Undefined, self.eval_value(other)?)),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], slot: Slot) -> Eval<Value> {
        let mut values = match self.take_state(slot) {
            Some(NodeState::Operands(values)) => values,
            _ => Vec::new(),
        };
        if values.is_empty() {
            let (this, function) = self.eval_callee(callee)?;
            values.reserve(args.len() + 2);
            values.push(this);
            values.push(function);
        }
        while values.len() < args.len() + 2 {
            match self.eval_value(&args[values.len() - 2]) {
                Ok(value) => values.push(value),
                Err(Abrupt::Suspend) => {
                    return Err(self.suspend_with(slot, NodeState::Operands(values)))
                }
                Err(other) => return Err(other),
            }
        }
        let mut values = values.into_iter();
        let this = values.next().unwrap_or_default();
        let function = values.next().unwrap_or_default();
        let args: Vec<Value> = values.collect();
        if !self.is_callable(&function) {
            return Err(self.type_error(format!("{} is not a function", callee_name(callee))));
        }
        self.call(&function, this, &args)
    }

    fn eval_object(&mut self, properties: &[ObjectProperty], slot: Slot) -> Eval<Value> {
        let (object, start) = match self.take_state(slot) {
            Some(NodeState::Literal { object, index }) => (object, index),
            _ => (self.create_object(), 0),
        };
        for (index, property) in properties.iter().enumerate().skip(start) {
            match property {
                ObjectProperty::Data(key, expr) => {
                    let value = match self.eval_value(expr) {
                        Err(Abrupt::Suspend) => {
                            return Err(self.suspend_with(slot, NodeState::Literal { object, index }))
                        }
                        result => result?,
                    };
                    self.realm.heap[object].define_own(
                        &self.realm.shapes,
                        key.clone(),
                        SlotValue::Data(value),
                        PropertyFlags::DEFAULT_DATA,
                    );
                }
                ObjectProperty::Getter(key, code) | ObjectProperty::Setter(key, code) => {
                    let scope = Rc::clone(&self.frame.scope);
                    let function = self.create_closure(code, scope);
                    let (mut getter, mut setter) = match self.realm.heap[object].own_property(key) {
                        Some((_, SlotValue::Accessor { getter, setter })) => (*getter, *setter),
                        _ => (None, None),
                    };
                    if matches!(property, ObjectProperty::Getter(..)) {
                        getter = Some(function);
                    } else {
                        setter = Some(function);
                    }
                    self.realm.heap[object].define_own(
                        &self.realm.shapes,
                        key.clone(),
                        SlotValue::Accessor { getter, setter },
                        PropertyFlags::ENUMERABLE | PropertyFlags::CONFIGURABLE | PropertyFlags::ACCESSOR,
                    );
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn eval_array(&mut self, elements: &[Expr], slot: Slot) -> Eval<Value> {
        let (array, start) = match self.take_state(slot) {
            Some(NodeState::Literal { object, index }) => (object, index),
            _ => (self.create_array(Vec::with_capacity(elements.len())), 0),
        };
        for (index, element) in elements.iter().enumerate().skip(start) {
            let value = match self.eval_value(element) {
                Err(Abrupt::Suspend) => {
                    return Err(self.suspend_with(slot, NodeState::Literal { object: array, index }))
                }
                result => result?,
            };
            let dense_limit = self.config.dense_element_limit;
            if let Some(storage) = self.realm.heap[array].elements_mut() {
                storage.push(value, dense_limit);
            }
        }
        Ok(Value::Object(array))
    }

    fn eval_sequence(&mut self, exprs: &[Expr], slot: Slot) -> Eval<Value> {
        let start = match self.take_state(slot) {
            Some(NodeState::Sequence { index, .. }) => index,
            _ => 0,
        };
        let mut last = Value::Undefined;
        for (index, expr) in exprs.iter().enumerate().skip(start) {
            last = match self.eval_value(expr) {
                Err(Abrupt::Suspend) => {
                    let state = NodeState::Sequence { index, scope: None };
                    return Err(self.suspend_with(slot, state));
                }
                result => result?,
            };
        }
        Ok(last)
    }

    fn eval_yield(&mut self, operand: Option<&Expr>, slot: Slot) -> Eval<Value> {
        if self.resume_kind() == Some(FunctionKind::AsyncGenerator) {
            return self.eval_async_yield(operand, slot);
        }
        if let Some(NodeState::Suspended) = self.take_state(slot) {
            return self.take_input()?.into_eval();
        }
        let value = match operand {
            Some(operand) => self.eval_value(operand)?,
            None => Value::Undefined,
        };
        self.set_suspension(Suspension::Yield(value))?;
        Err(self.suspend_with(slot, NodeState::Suspended))
    }

    /// `yield` in an async generator: await the operand, yield it, and on a
    /// `return` request await the returned value before returning.
    fn eval_async_yield(&mut self, operand: Option<&Expr>, slot: Slot) -> Eval<Value> {
        let phase = match self.take_state(slot) {
            Some(NodeState::AsyncYield(phase)) => phase,
            _ => {
                let value = match operand {
                    Some(operand) => self.eval_value(operand)?,
                    None => Value::Undefined,
                };
                self.start_await(value)?;
                return Err(self.suspend_with(slot, NodeState::AsyncYield(AsyncYieldPhase::AwaitOperand)));
            }
        };
        let input = self.take_input()?;
        match (phase, input) {
            (AsyncYieldPhase::AwaitOperand, Completion::Normal(value)) => {
                self.set_suspension(Suspension::Yield(value))?;
                Err(self.suspend_with(slot, NodeState::AsyncYield(AsyncYieldPhase::Yielded)))
            }
            (AsyncYieldPhase::Yielded, Completion::Return(value)) => {
                self.start_await(value)?;
                Err(self.suspend_with(slot, NodeState::AsyncYield(AsyncYieldPhase::AwaitReturn)))
            }
            (AsyncYieldPhase::AwaitReturn, Completion::Normal(value)) => Err(Abrupt::Return(value)),
            (_, completion) => completion.into_eval(),
        }
    }

    fn eval_yield_star(&mut self, operand: &Expr, slot: Slot) -> Eval<Value> {
        let (iterator, next, received) = match self.take_state(slot) {
            Some(NodeState::YieldStar { iterator, next }) => {
                let received = self.take_input()?;
                (iterator, next, received)
            }
            _ => {
                let iterable = self.eval_value(operand)?;
                let (iterator, next) = self.get_iterator(&iterable)?;
                (iterator, next, Completion::Normal(Value::Undefined))
            }
        };
        let result = match received {
            Completion::Normal(value) => self.call(&next, iterator.clone(), &[value])?,
            Completion::Throw(error) => {
                let throw = self.get_property(&iterator, &PropertyKey::from("throw"))?;
                if throw.is_nullish() {
                    self.iterator_close(&iterator)?;
                    return Err(self.type_error("The iterator does not provide a 'throw' method"));
                }
                self.call(&throw, iterator.clone(), &[error])?
            }
            Completion::Return(value) => {
                let method = self.get_property(&iterator, &PropertyKey::from("return"))?;
                if method.is_nullish() {
                    return Err(Abrupt::Return(value));
                }
                let result = self.call(&method, iterator.clone(), &[value])?;
                self.require_iter_result(&result)?;
                let (value, done) = self.iter_result(&result)?;
                if done {
                    return Err(Abrupt::Return(value));
                }
                self.set_suspension(Suspension::Yield(value))?;
                return Err(self.suspend_with(slot, NodeState::YieldStar { iterator, next }));
            }
        };
        self.require_iter_result(&result)?;
        let (value, done) = self.iter_result(&result)?;
        if done {
            return Ok(value);
        }
        self.set_suspension(Suspension::Yield(value))?;
        Err(self.suspend_with(slot, NodeState::YieldStar { iterator, next }))
    }

    fn eval_await(&mut self, operand: &Expr, slot: Slot) -> Eval<Value> {
        if let Some(NodeState::Suspended) = self.take_state(slot) {
            return self.take_input()?.into_eval();
        }
        let value = self.eval_value(operand)?;
        self.start_await(value)?;
        Err(self.suspend_with(slot, NodeState::Suspended))
    }

    pub(crate) fn require_iter_result(&mut self, result: &Value) -> Eval<()> {
        if result.as_object().is_some() {
            Ok(())
        } else {
            Err(self.type_error(format!("Iterator result {} is not an object", result)))
        }
    }

    /// GetIterator: the iterator object and its `next` method.
    pub(crate) fn get_iterator(&mut self, iterable: &Value) -> Eval<(Value, Value)> {
        let method = if iterable.is_nullish() {
            Value::Undefined
        } else {
            self.get_property(iterable, &PropertyKey::Symbol(core_types::Symbol::iterator()))?
        };
        if !self.is_callable(&method) {
            return Err(self.type_error(format!("{} is not iterable", self.describe(iterable))));
        }
        let iterator = self.call(&method, iterable.clone(), &[])?;
        if iterator.as_object().is_none() {
            return Err(self.type_error("Result of the Symbol.iterator method is not an object"));
        }
        let next = self.get_property(&iterator, &PropertyKey::from("next"))?;
        Ok((iterator, next))
    }

    /// IteratorClose: call `return` if the iterator has one.
    pub(crate) fn iterator_close(&mut self, iterator: &Value) -> Eval<()> {
        let method = self.get_property(iterator, &PropertyKey::from("return"))?;
        if method.is_nullish() {
            return Ok(());
        }
        let result = self.call(&method, iterator.clone(), &[])?;
        self.require_iter_result(&result)
    }
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::StrictEq
            | BinaryOp::StrictNe
            | BinaryOp::Eq
            | BinaryOp::Ne
    )
}

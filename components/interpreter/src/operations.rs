//! Type conversions and operators.

use std::cmp::Ordering;
use std::sync::Arc;

use core_types::{JsString, PropertyKey, Value};
use object_model::ObjectClass;

use crate::error::Eval;
use crate::interpreter::Interpreter;
use crate::node::BinaryOp;

/// Preferred type for ToPrimitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Default,
    Number,
    String,
}

impl Interpreter {
    /// Whether `value` is a callable object.
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.realm.heap.get(id))
            .map_or(false, |object| object.is_callable())
    }

    /// `typeof value`.
    pub(crate) fn type_of(&self, value: &Value) -> &'static str {
        match value.type_of_primitive() {
            Some(name) => name,
            None if self.is_callable(value) => "function",
            None => "object",
        }
    }

    /// Short description of a value for error messages.
    pub(crate) fn describe(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("\"{}\"", s),
            Value::Object(id) => match self.realm.heap.get(*id).map(|object| object.class()) {
                Some(ObjectClass::Function(_)) => "function".to_string(),
                Some(ObjectClass::Array(_)) => "array".to_string(),
                _ => "object".to_string(),
            },
            other => other.to_string(),
        }
    }

    pub(crate) fn to_primitive(&mut self, value: &Value, hint: Hint) -> Eval<Value> {
        if value.as_object().is_none() {
            return Ok(value.clone());
        }
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Default | Hint::Number => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get_property(value, &PropertyKey::from(name))?;
            if self.is_callable(&method) {
                let result = self.call(&method, value.clone(), &[])?;
                if result.as_object().is_none() {
                    return Ok(result);
                }
            }
        }
        Err(self.type_error("Cannot convert object to primitive value"))
    }

    pub(crate) fn to_number(&mut self, value: &Value) -> Eval<f64> {
        if let Some(n) = value.to_number_primitive() {
            return Ok(n);
        }
        match value {
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::Number)?;
                self.to_number(&primitive)
            }
            _ => Err(self.type_error("Cannot convert a Symbol value to a number")),
        }
    }

    pub(crate) fn to_int32(&mut self, value: &Value) -> Eval<i32> {
        match value {
            Value::Smi(n) => Ok(*n),
            other => Ok(Value::to_int32(self.to_number(other)?)),
        }
    }

    /// ToString.
    pub(crate) fn to_js_string(&mut self, value: &Value) -> Eval<JsString> {
        match value {
            Value::String(s) => Ok(Arc::clone(s)),
            Value::Symbol(_) => Err(self.type_error("Cannot convert a Symbol value to a string")),
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::String)?;
                self.to_js_string(&primitive)
            }
            other => Ok(Arc::from(other.to_string())),
        }
    }

    /// ToPropertyKey.
    pub(crate) fn to_property_key(&mut self, value: &Value) -> Eval<PropertyKey> {
        match value {
            Value::Smi(n) if *n >= 0 => Ok(PropertyKey::from_index(*n as u32)),
            Value::Symbol(symbol) => Ok(PropertyKey::Symbol(symbol.clone())),
            Value::String(s) => Ok(PropertyKey::String(Arc::clone(s))),
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::String)?;
                self.to_property_key(&primitive)
            }
            other => Ok(PropertyKey::String(Arc::from(other.to_string()))),
        }
    }

    /// Apply a binary operator to evaluated operands.
    pub(crate) fn binary_op(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Eval<Value> {
        if let (Value::Smi(a), Value::Smi(b)) = (left, right) {
            if let Some(value) = smi_binary(op, *a, *b) {
                return Ok(value);
            }
        }
        match op {
            BinaryOp::Add => self.add(left, right),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Exp => {
                let a = self.to_number(left)?;
                let b = self.to_number(right)?;
                Ok(Value::number(arithmetic(op, a, b)))
            }
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::UShr => {
                let a = self.to_int32(left)?;
                let b = self.to_int32(right)?;
                Ok(bitwise(op, a, b))
            }
            BinaryOp::Lt => Ok(Value::Boolean(self.less_than(left, right, true)? == Some(true))),
            BinaryOp::Gt => Ok(Value::Boolean(self.less_than(right, left, false)? == Some(true))),
            BinaryOp::Le => Ok(Value::Boolean(
                self.less_than(right, left, false)? == Some(false),
            )),
            BinaryOp::Ge => Ok(Value::Boolean(self.less_than(left, right, true)? == Some(false))),
            BinaryOp::Eq => Ok(Value::Boolean(self.loose_equals(left, right)?)),
            BinaryOp::Ne => Ok(Value::Boolean(!self.loose_equals(left, right)?)),
            BinaryOp::StrictEq => Ok(Value::Boolean(left.strict_equals(right))),
            BinaryOp::StrictNe => Ok(Value::Boolean(!left.strict_equals(right))),
            BinaryOp::InstanceOf => Ok(Value::Boolean(self.instance_of(left, right)?)),
        }
    }

    fn add(&mut self, left: &Value, right: &Value) -> Eval<Value> {
        let a = self.to_primitive(left, Hint::Default)?;
        let b = self.to_primitive(right, Hint::Default)?;
        if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
            let a = self.to_js_string(&a)?;
            let b = self.to_js_string(&b)?;
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(&a);
            joined.push_str(&b);
            return Ok(Value::String(Arc::from(joined)));
        }
        let a = self.to_number(&a)?;
        let b = self.to_number(&b)?;
        Ok(Value::number(a + b))
    }

    /// Abstract relational comparison `x < y`; `None` when either side is NaN.
    fn less_than(&mut self, x: &Value, y: &Value, left_first: bool) -> Eval<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Hint::Number)?;
            (px, self.to_primitive(y, Hint::Number)?)
        } else {
            let py = self.to_primitive(y, Hint::Number)?;
            (self.to_primitive(x, Hint::Number)?, py)
        };
        if let (Value::String(a), Value::String(b)) = (&px, &py) {
            return Ok(Some(a.encode_utf16().cmp(b.encode_utf16()) == Ordering::Less));
        }
        let a = self.to_number(&px)?;
        let b = self.to_number(&py)?;
        if a.is_nan() || b.is_nan() {
            Ok(None)
        } else {
            Ok(Some(a < b))
        }
    }

    /// `==`.
    pub(crate) fn loose_equals(&mut self, a: &Value, b: &Value) -> Eval<bool> {
        if same_type(a, b) {
            return Ok(a.strict_equals(b));
        }
        match (a, b) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => Ok(false),
            (Value::Boolean(x), _) => self.loose_equals(&Value::Smi(*x as i32), b),
            (_, Value::Boolean(y)) => self.loose_equals(a, &Value::Smi(*y as i32)),
            (Value::String(_), Value::Smi(_) | Value::Double(_))
            | (Value::Smi(_) | Value::Double(_), Value::String(_)) => {
                let x = self.to_number(a)?;
                let y = self.to_number(b)?;
                Ok(x == y)
            }
            (Value::Object(_), _) => {
                let primitive = self.to_primitive(a, Hint::Default)?;
                self.loose_equals(&primitive, b)
            }
            (_, Value::Object(_)) => {
                let primitive = self.to_primitive(b, Hint::Default)?;
                self.loose_equals(a, &primitive)
            }
            _ => Ok(false),
        }
    }

    /// `value instanceof target`.
    pub(crate) fn instance_of(&mut self, value: &Value, target: &Value) -> Eval<bool> {
        if target.as_object().is_none() {
            return Err(self.type_error("Right-hand side of 'instanceof' is not an object"));
        }
        if !self.is_callable(target) {
            return Err(self.type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let Some(mut current) = value.as_object() else {
            return Ok(false);
        };
        let prototype = self.get_property(target, &PropertyKey::from("prototype"))?;
        let Some(prototype) = prototype.as_object() else {
            return Err(self.type_error(format!(
                "Function has non-object prototype '{}' in instanceof check",
                prototype
            )));
        };
        while let Some(next) = self.realm.heap.get(current).and_then(|o| o.prototype()) {
            if next == prototype {
                return Ok(true);
            }
            current = next;
        }
        Ok(false)
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Smi(_) | Value::Double(_), Value::Smi(_) | Value::Double(_)) => true,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Integer fast path; `None` when the result does not fit or needs the
/// generic path.
pub(crate) fn smi_binary(op: BinaryOp, a: i32, b: i32) -> Option<Value> {
    let value = match op {
        BinaryOp::Add => Value::Smi(a.checked_add(b)?),
        BinaryOp::Sub => Value::Smi(a.checked_sub(b)?),
        BinaryOp::Mul => Value::Smi(smi_mul(a, b)?),
        BinaryOp::Lt => Value::Boolean(a < b),
        BinaryOp::Le => Value::Boolean(a <= b),
        BinaryOp::Gt => Value::Boolean(a > b),
        BinaryOp::Ge => Value::Boolean(a >= b),
        BinaryOp::Eq | BinaryOp::StrictEq => Value::Boolean(a == b),
        BinaryOp::Ne | BinaryOp::StrictNe => Value::Boolean(a != b),
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::UShr => bitwise(op, a, b),
        _ => return None,
    };
    Some(value)
}

/// `a * b` unless it overflows or is negative zero.
pub(crate) fn smi_mul(a: i32, b: i32) -> Option<i32> {
    let product = a.checked_mul(b)?;
    if product == 0 && (a < 0 || b < 0) {
        None
    } else {
        Some(product)
    }
}

fn arithmetic(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Exp => {
            if b.is_nan() || (a.abs() == 1.0 && b.is_infinite()) {
                f64::NAN
            } else {
                a.powf(b)
            }
        }
        _ => a + b,
    }
}

fn bitwise(op: BinaryOp, a: i32, b: i32) -> Value {
    let shift = (b as u32) & 31;
    match op {
        BinaryOp::BitAnd => Value::Smi(a & b),
        BinaryOp::BitOr => Value::Smi(a | b),
        BinaryOp::BitXor => Value::Smi(a ^ b),
        BinaryOp::Shl => Value::Smi(a.wrapping_shl(shift)),
        BinaryOp::Shr => Value::Smi(a >> shift),
        _ => Value::number(((a as u32) >> shift) as f64),
    }
}

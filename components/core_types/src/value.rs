//! JavaScript value representation.
//!
//! This module provides the core `Value` enum. Primitive values are stored
//! inline; objects are referenced by [`ObjectId`] into the realm heap, which
//! keeps `Value` cheap to clone and free of lifetimes.

use std::fmt;
use std::sync::Arc;

use crate::key::Symbol;

/// Immutable, shareable JavaScript string.
pub type JsString = Arc<str>;

/// Handle of an object in the realm heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Index into the heap arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Represents any JavaScript value.
///
/// Small integers are kept in the `Smi` variant so that integer arithmetic
/// in the interpreter's typed entry points never has to go through `f64`.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.5);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(float.as_number(), Some(3.5));
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// JavaScript undefined value
    #[default]
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(JsString),
    /// JavaScript symbol value
    Symbol(Symbol),
    /// Heap object (ordinary, array, function, proxy, foreign, internal)
    Object(ObjectId),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Symbol(s) => write!(f, "{:?}", s),
            Value::Object(id) => write!(f, "Object({})", id.0),
        }
    }
}

/// Structural equality for tests and caches: numbers compare by numeric
/// value (`Smi(1) == Double(1.0)`), objects by identity. This is neither
/// `===` nor SameValue; use [`Value::strict_equals`] or
/// [`Value::same_value`] for language semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
                _ => false,
            },
        }
    }
}

impl Value {
    /// Build a number value, using `Smi` when the number is an integer that
    /// fits and is not negative zero.
    pub fn number(n: f64) -> Value {
        if n.fract() == 0.0
            && n >= i32::MIN as f64
            && n <= i32::MAX as f64
            && !(n == 0.0 && n.is_sign_negative())
        {
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// Build a string value.
    pub fn string(s: &str) -> Value {
        Value::String(Arc::from(s))
    }

    /// Returns the object handle if this is an object.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for `undefined` and `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Smi(0).is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(!Value::string("").is_truthy());
    /// assert!(Value::string("0").is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// The `typeof` result for primitives; `None` for objects, whose answer
    /// depends on whether they are callable.
    pub fn type_of_primitive(&self) -> Option<&'static str> {
        match self {
            Value::Undefined => Some("undefined"),
            Value::Null => Some("object"),
            Value::Boolean(_) => Some("boolean"),
            Value::Smi(_) | Value::Double(_) => Some("number"),
            Value::String(_) => Some("string"),
            Value::Symbol(_) => Some("symbol"),
            Value::Object(_) => None,
        }
    }

    /// ToNumber for primitive values. Returns `None` for objects and for
    /// symbols (which throw a TypeError in the caller).
    pub fn to_number_primitive(&self) -> Option<f64> {
        match self {
            Value::Undefined => Some(f64::NAN),
            Value::Null => Some(0.0),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Smi(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            Value::String(s) => Some(string_to_number(s)),
            Value::Symbol(_) | Value::Object(_) => None,
        }
    }

    /// Strict equality (`===`).
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(x), Some(y)) => x == y,
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => self == other,
        }
    }

    /// SameValue: like `===` but `NaN` equals `NaN` and `+0` differs from `-0`.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(x), Some(y)) => {
                if x.is_nan() && y.is_nan() {
                    true
                } else {
                    x == y && x.is_sign_negative() == y.is_sign_negative()
                }
            }
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => self == other,
        }
    }
}

/// ToInt32 on an already converted number.
pub(crate) fn f64_to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc() % 4_294_967_296.0;
    let int = if int < 0.0 { int + 4_294_967_296.0 } else { int };
    if int >= 2_147_483_648.0 {
        (int - 4_294_967_296.0) as i32
    } else {
        int as i32
    }
}

impl Value {
    /// ToInt32 of a number value; non-numbers give 0.
    pub fn to_int32(n: f64) -> i32 {
        f64_to_int32(n)
    }
}

/// StringToNumber for the decimal, hexadecimal and `Infinity` forms.
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        other => {
            if other.contains(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                f64::NAN
            } else {
                other.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
    }
}

/// Number::toString(10) for the common cases.
fn number_to_string(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        if n.is_sign_positive() {
            write!(f, "Infinity")
        } else {
            write!(f, "-Infinity")
        }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        // Integer-valued doubles display without decimal point; -0 prints as 0
        write!(f, "{}", n as i128)
    } else {
        write!(f, "{}", n)
    }
}

/// Implementation of Display for JavaScript string conversion of primitives.
///
/// Objects print as `[object Object]`; the interpreter performs ToPrimitive
/// before reaching this for real conversions.
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Double(2.5).to_string(), "2.5");
/// assert_eq!(Value::Double(-0.0).to_string(), "0");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => number_to_string(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Symbol(s) => write!(f, "Symbol({})", s.description().unwrap_or("")),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by every engine
//! component: value representation, property keys, symbols and the error
//! taxonomy.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`PropertyKey`] - String or symbol property key
//! - [`Symbol`] - Unique symbol identity, including well-known symbols
//! - [`JsError`] - ECMAScript error (TypeError, RangeError, ...)
//! - [`InternalError`] - Engine invariant violation, never user-catchable
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, PropertyKey, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of_primitive(), Some("number"));
//!
//! let key = PropertyKey::from("length");
//! assert_eq!(key.as_str(), Some("length"));
//!
//! let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
//! assert_eq!(error.to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod key;
mod value;

pub use error::{ErrorKind, InternalError, JsError};
pub use key::{PropertyKey, Symbol};
pub use value::{JsString, ObjectId, Value};

//! Property keys and symbols.
//!
//! A property key is either a string or a symbol. Array indices are plain
//! string keys in canonical numeric form; [`PropertyKey::array_index`]
//! recognizes them so array objects can route them to element storage.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::value::JsString;

/// First id handed out to user-created symbols; lower ids are well-known.
const FIRST_USER_SYMBOL: u64 = 16;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(FIRST_USER_SYMBOL);

/// A JavaScript symbol.
///
/// Identity is the numeric id; the description is informational only.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<JsString>,
}

impl Symbol {
    /// Create a fresh, unique symbol.
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(Arc::from),
        }
    }

    const fn well_known(id: u64) -> Self {
        Self {
            id,
            description: None,
        }
    }

    /// `Symbol.iterator`
    pub const fn iterator() -> Self {
        Self::well_known(1)
    }

    /// `Symbol.asyncIterator`
    pub const fn async_iterator() -> Self {
        Self::well_known(2)
    }

    /// `Symbol.toStringTag`
    pub const fn to_string_tag() -> Self {
        Self::well_known(3)
    }

    /// The unique id of this symbol.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The symbol's description, as passed to `Symbol(description)`.
    pub fn description(&self) -> Option<&str> {
        match self.id {
            1 => Some("Symbol.iterator"),
            2 => Some("Symbol.asyncIterator"),
            3 => Some("Symbol.toStringTag"),
            _ => self.description.as_deref(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// A property key: string or symbol.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String-keyed property (including canonical array indices)
    String(JsString),
    /// Symbol-keyed property
    Symbol(Symbol),
}

impl PropertyKey {
    /// Returns the string form if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    /// Returns the array index if this key is a canonical numeric string
    /// in the range `0..2^32 - 1`.
    ///
    /// ```
    /// use core_types::PropertyKey;
    ///
    /// assert_eq!(PropertyKey::from("12").array_index(), Some(12));
    /// assert_eq!(PropertyKey::from("012").array_index(), None);
    /// assert_eq!(PropertyKey::from("x").array_index(), None);
    /// ```
    pub fn array_index(&self) -> Option<u32> {
        let s = self.as_str()?;
        if s.is_empty() || s.len() > 10 || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match s.parse::<u64>() {
            Ok(n) if n < u32::MAX as u64 => Some(n as u32),
            _ => None,
        }
    }

    /// Key for an array index.
    pub fn from_index(index: u32) -> Self {
        PropertyKey::String(Arc::from(index.to_string()))
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(Arc::from(s))
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        PropertyKey::String(s)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(symbol: Symbol) -> Self {
        PropertyKey::Symbol(symbol)
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{:?}", s),
            PropertyKey::Symbol(sym) => write!(f, "{:?}", sym),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => f.write_str(s),
            PropertyKey::Symbol(sym) => write!(f, "Symbol({})", sym.description().unwrap_or("")),
        }
    }
}

#![forbid(unsafe_code)]

//! Dynamically-typed values with statically-typed access.
//!
//! [`Value`] is a tagged variant holding exactly one of the supported
//! scalar kinds (bool, i32, i64, f64, UTF-8 string, opaque blob) or one of
//! the five container kinds. The heterogeneous [`List`] and both map kinds
//! hold `Value` elements themselves, so arbitrary nesting is possible.
//!
//! Typed access goes through [`FieldValue`]: `wrap` converts a native
//! value into a `Value`, `unwrap` reads it back and fails with
//! [`ValueError::WrongType`] when the tag does not match, and `can_unwrap`
//! tests the tag without reading.
//!
//! # Invariants
//!
//! - A `Value` holds exactly one tag at a time; there is no coercion
//!   between tags (an `I32` never reads as an `I64`).
//! - Equality is tag equality plus content equality.
//! - Iteration order of the map kinds is unspecified.
//! - `Blob` is a reserved tag: it participates in equality and
//!   serialization but has no typed accessor yet.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::field_hash::FieldId;

/// Object identifier minted by a state: two zero bits, a 14-bit session
/// id, and a 48-bit per-session counter, packed MSB-first.
pub type ObjectId = i64;

/// Session identifier; must fit in 14 bits (validated at state
/// construction, not here).
pub type SessionId = u16;

/// Heterogeneous list of values.
pub type List = Vec<Value>;
/// List of 64-bit integers (or [`ObjectId`]s).
pub type IntList = Vec<i64>;
/// List of UTF-8 strings.
pub type StrList = Vec<String>;
/// Map from hashed field names to values.
pub type Map = FxHashMap<FieldId, Value>;
/// Map from strings to values.
pub type StrMap = FxHashMap<String, Value>;

/// A dynamically-typed value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value present.
    #[default]
    Unset,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    /// Opaque bytes. Reserved; no typed accessor is generated for it.
    Blob(Vec<u8>),
    List(List),
    IntList(IntList),
    StrList(StrList),
    Map(Map),
    StrMap(StrMap),
}

/// Discriminant of a [`Value`], used in typed-access errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueTag {
    Unset,
    Bool,
    I32,
    I64,
    F64,
    Str,
    Blob,
    List,
    IntList,
    StrList,
    Map,
    StrMap,
}

impl Value {
    /// The tag currently held.
    #[must_use]
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Unset => ValueTag::Unset,
            Value::Bool(_) => ValueTag::Bool,
            Value::I32(_) => ValueTag::I32,
            Value::I64(_) => ValueTag::I64,
            Value::F64(_) => ValueTag::F64,
            Value::Str(_) => ValueTag::Str,
            Value::Blob(_) => ValueTag::Blob,
            Value::List(_) => ValueTag::List,
            Value::IntList(_) => ValueTag::IntList,
            Value::StrList(_) => ValueTag::StrList,
            Value::Map(_) => ValueTag::Map,
            Value::StrMap(_) => ValueTag::StrMap,
        }
    }

    /// True when no value is present.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }
}

/// Conversion between native types and [`Value`].
///
/// Implemented for every supported scalar and container kind. `unwrap`
/// clones container contents; readers that only need a tag check should
/// use `can_unwrap`.
pub trait FieldValue: Sized {
    /// The tag this type wraps into.
    const TAG: ValueTag;

    /// Convert a native value into a [`Value`].
    fn wrap(self) -> Value;

    /// Read the native value back, failing if the tag does not match.
    fn unwrap(value: &Value) -> Result<Self, ValueError>;

    /// Whether `unwrap` would succeed on this value.
    fn can_unwrap(value: &Value) -> bool {
        value.tag() == Self::TAG
    }
}

/// Wrap a native value into a [`Value`].
///
/// Free-function spelling of [`FieldValue::wrap`], convenient when
/// building container elements in place.
pub fn wrap<T: FieldValue>(value: T) -> Value {
    value.wrap()
}

macro_rules! impl_field_value {
    ($($ty:ty => $tag:ident),+ $(,)?) => {$(
        impl FieldValue for $ty {
            const TAG: ValueTag = ValueTag::$tag;

            fn wrap(self) -> Value {
                Value::$tag(self)
            }

            fn unwrap(value: &Value) -> Result<Self, ValueError> {
                match value {
                    Value::$tag(inner) => Ok(inner.clone()),
                    other => Err(ValueError::WrongType {
                        expected: ValueTag::$tag,
                        actual: other.tag(),
                    }),
                }
            }
        }
    )+};
}

impl_field_value! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    f64 => F64,
    String => Str,
    List => List,
    IntList => IntList,
    StrList => StrList,
    Map => Map,
    StrMap => StrMap,
}

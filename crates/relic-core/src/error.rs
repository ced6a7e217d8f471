#![forbid(unsafe_code)]

//! Typed-access failures in the value layer.

use thiserror::Error;

use crate::field_hash::FieldId;
use crate::value::ValueTag;

/// Error raised by typed access to a [`Value`](crate::Value) or a field
/// map entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The value holds a different tag than the access requested.
    #[error("expected a {expected:?} value, found {actual:?}")]
    WrongType { expected: ValueTag, actual: ValueTag },

    /// The field is not present in the map.
    #[error("field {0:#010x} is not present")]
    MissingField(FieldId),
}

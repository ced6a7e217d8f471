#![forbid(unsafe_code)]

//! Core value model for the relic state engine.
//!
//! # Role in relic
//! `relic-core` is the data layer. It owns the dynamically-typed
//! [`Value`] variant, the five container kinds that nest inside it, and
//! the compile-time field-name hashing that turns declared field names
//! into stable 32-bit map keys.
//!
//! # Primary responsibilities
//! - **[`field_id`]**: const FNV-1a hashing of field names to [`FieldId`]s.
//! - **[`Value`]**: tagged variant holding one scalar or container value.
//! - **[`FieldValue`]**: the wrap / unwrap / can_unwrap surface used by
//!   typed field accessors.
//!
//! # How it fits in the system
//! The engine crate (`relic-engine`) stores command arguments and results
//! as shared `FieldId → Value` maps and layers typed accessors on top.
//! Wire codecs linearize [`Value`] trees through the serde derives; no
//! concrete format ships here.

pub mod error;
pub mod field_hash;
pub mod value;

pub use error::ValueError;
pub use field_hash::{field_id, FieldId};
pub use value::{
    wrap, FieldValue, IntList, List, Map, ObjectId, SessionId, StrList, StrMap, Value, ValueTag,
};

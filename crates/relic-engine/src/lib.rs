#![forbid(unsafe_code)]

//! Command-sourced state engine.
//!
//! # Role in relic
//! `relic-engine` is the runtime. It turns declared command schemas into
//! deterministic, reversible, replayable mutations of an application's
//! domain model, with linear undo/redo history and an object-id scheme
//! that lets concurrent sessions mint ids without coordination.
//!
//! # Primary responsibilities
//! - **[`Command`] / [`Apply`]**: the schema and behavior halves of a
//!   command type; schemas come from the [`command!`] macro.
//! - **[`CommandRegistry`]**: per-state-family dispatch table from command
//!   id to apply/revert pair, with capability acceptance checks.
//! - **[`State`]**: owns the model, the session's object-id allocator, and
//!   the undo/redo deques; every mutation flows through [`State::run`].
//!
//! # Replication
//! A command on the wire is `(command_id, args)`; a recorded history entry
//! is `(command_id, args, result)`. [`State::run_dynamic`] executes the
//! former on a peer, producing the same result map as the origin;
//! [`State::replay`] re-executes the latter with the result frozen,
//! reproducing the exact transition (minted ids included).
//!
//! # What this crate does not do
//! No wire format (the value model is serde-ready; codecs live outside),
//! no persistence, no transport, no cross-command transactions, and no
//! automatic inverses; every command records what it needs to undo
//! itself.

pub mod command;
pub mod error;
mod macros;
pub mod model;
pub mod registry;
pub mod state;

pub use command::{Apply, Command, CommandId, CommandResults, NoResults, ResultAccess};
pub use error::{EngineError, Result};
pub use model::{Capability, Model};
pub use registry::CommandRegistry;
pub use state::{ApplyCtx, ObjectIds, State, StateConfig};

// The value model, re-exported so command declarations and their authors
// need only this crate.
pub use relic_core::{
    field_id, wrap, FieldId, FieldValue, IntList, List, Map, ObjectId, SessionId, StrList, StrMap,
    Value, ValueError, ValueTag,
};

#![forbid(unsafe_code)]

//! The command contract: shared argument maps, result access, and the
//! traits implemented by every command type.
//!
//! A command is a self-describing value: a [`CommandId`] plus an argument
//! map of `FieldId → Value` entries. It carries **no other instance
//! state** (the `command!` macro generates structs holding exactly the
//! shared map handle), so a command rebuilt from `(id, args)` alone is
//! observationally identical to the one the caller constructed. That is
//! what makes a recorded or transmitted command replayable.
//!
//! # Argument sharing and copy-on-write
//!
//! `args()` hands out a snapshot handle that is guaranteed never to change.
//! Setters go through [`Arc::make_mut`]: while the map is unshared they
//! mutate in place, and the moment any other handle exists (a history
//! record, a replica, an earlier `args()` snapshot) the next mutation
//! clones the map and rebinds the command to its private copy.
//!
//! # Results
//!
//! [`ResultAccess`] is the façade over a command's result map. It is
//! writable exactly once, during the first apply, and frozen everywhere
//! else (undo, redo, replicas). Commands that mint fresh object ids must
//! read back the recorded id on replay instead of minting again:
//!
//! ```ignore
//! let id = if results.has_entry_id() {
//!     results.entry_id()?
//! } else {
//!     let id = ctx.next_object_id()?;
//!     results.set_entry_id(id)?;
//!     id
//! };
//! ```

use std::sync::Arc;

use relic_core::{FieldId, Map, Value};

use crate::error::{EngineError, Result};
use crate::model::Capability;
use crate::state::ApplyCtx;

/// Identifier of a command type, unique within its registry.
///
/// Authors use positive ids; ids at or below zero are reserved.
pub type CommandId = i32;

/// Schema half of a command type, generated by the `command!` macro.
pub trait Command: Sized {
    /// Unique id within the registry this command is registered in.
    const ID: CommandId;

    /// The capability (or concrete model type) this command targets.
    type Target: Capability + ?Sized;

    /// Typed façade over this command's result map.
    type Results: CommandResults;

    /// Rebuild the command from a shared argument map.
    ///
    /// Used by dispatch and by replicas; paired with the no-instance-state
    /// rule this reconstruction loses nothing.
    fn from_args(args: Arc<Map>) -> Self;

    /// Snapshot of the argument map.
    ///
    /// The returned handle can be stored indefinitely and will never
    /// observe later mutations of the command.
    fn args(&self) -> Arc<Map>;

    /// The id of this command type.
    fn command_id(&self) -> CommandId {
        Self::ID
    }
}

/// Behavior half of a command type, written by the author.
pub trait Apply: Command {
    /// Run the command forward against the target.
    ///
    /// On the first apply `results` is writable and must capture whatever
    /// the command needs to revert and to replay consistently (minted ids,
    /// overwritten values). On replay `results` is frozen and already
    /// populated. Validate all preconditions before mutating anything;
    /// a failed apply must leave the target untouched.
    fn apply(
        &self,
        target: &mut Self::Target,
        ctx: &ApplyCtx<'_>,
        results: &mut Self::Results,
    ) -> Result<()>;

    /// Reverse the command's effects using the recorded results.
    fn revert(&self, target: &mut Self::Target, results: &Self::Results) -> Result<()>;
}

/// Typed result façade, generated per command by the `command!` macro.
pub trait CommandResults: Sized {
    /// Wrap a result map handle.
    fn from_access(access: ResultAccess) -> Self;

    /// Release the underlying handle.
    fn into_access(self) -> ResultAccess;
}

/// Handle to a command's result map with a mutability flag.
///
/// Mutable only for the first apply; every later holder (history records,
/// redo, revert, replicas) sees a frozen view, and writes through it fail
/// with [`EngineError::ResultMisuse`].
#[derive(Debug, Clone)]
pub struct ResultAccess {
    map: Arc<Map>,
    mutable: bool,
}

impl ResultAccess {
    /// Fresh writable map for a first apply.
    pub(crate) fn first_apply() -> Self {
        Self {
            map: Arc::new(Map::default()),
            mutable: true,
        }
    }

    /// Read-only view of a recorded result map.
    #[must_use]
    pub fn frozen(map: Arc<Map>) -> Self {
        Self { map, mutable: false }
    }

    /// Read a result field.
    #[must_use]
    pub fn get(&self, field: FieldId) -> Option<&Value> {
        self.map.get(&field)
    }

    /// Write a result field. Fails unless this is the first apply.
    pub fn set(&mut self, field: FieldId, value: Value) -> Result<()> {
        if !self.mutable {
            return Err(EngineError::ResultMisuse);
        }
        Arc::make_mut(&mut self.map).insert(field, value);
        Ok(())
    }

    /// Whether writes are currently allowed.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Release the map, freezing it for history.
    #[must_use]
    pub fn into_map(self) -> Arc<Map> {
        self.map
    }
}

/// Results façade for commands that declare no result fields.
#[derive(Debug)]
pub struct NoResults {
    access: ResultAccess,
}

impl CommandResults for NoResults {
    fn from_access(access: ResultAccess) -> Self {
        Self { access }
    }

    fn into_access(self) -> ResultAccess {
        self.access
    }
}

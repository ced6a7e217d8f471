#![forbid(unsafe_code)]

//! Per-state-family command dispatch table.
//!
//! A [`CommandRegistry`] maps each [`CommandId`] to a pair of erased
//! function pointers that reconstruct the typed command from its argument
//! map and run it forward or backward. Both shims check capability
//! acceptance first, so running a command against a model that does not
//! satisfy its target fails with an inapplicable-command error before
//! anything is touched.
//!
//! One registry may be shared by several state families; that is how
//! capability-targeted commands reach every model type that satisfies
//! them. Registration is explicit: build the registry at startup, then
//! hand `Arc<CommandRegistry>` clones to the states that use it.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use relic_core::Map;

use crate::command::{Apply, CommandId, CommandResults, ResultAccess};
use crate::error::{EngineError, Result};
use crate::model::{Capability, Model};
use crate::state::ApplyCtx;

type ApplyFn =
    fn(&mut dyn Model, &ApplyCtx<'_>, &Arc<Map>, ResultAccess) -> Result<ResultAccess>;
type RevertFn = fn(&mut dyn Model, &Arc<Map>, &Arc<Map>) -> Result<()>;

/// Dispatch entry for one command type.
pub(crate) struct RegistryEntry {
    pub(crate) apply: ApplyFn,
    pub(crate) revert: RevertFn,
}

fn apply_command<C: Apply>(
    model: &mut dyn Model,
    ctx: &ApplyCtx<'_>,
    args: &Arc<Map>,
    access: ResultAccess,
) -> Result<ResultAccess> {
    let Some(target) = <C::Target as Capability>::accept(model) else {
        return Err(EngineError::Inapplicable);
    };
    let command = C::from_args(Arc::clone(args));
    let mut results = C::Results::from_access(access);
    command.apply(target, ctx, &mut results)?;
    Ok(results.into_access())
}

fn revert_command<C: Apply>(
    model: &mut dyn Model,
    args: &Arc<Map>,
    result: &Arc<Map>,
) -> Result<()> {
    let Some(target) = <C::Target as Capability>::accept(model) else {
        return Err(EngineError::Inapplicable);
    };
    let command = C::from_args(Arc::clone(args));
    let results = C::Results::from_access(ResultAccess::frozen(Arc::clone(result)));
    command.revert(target, &results)
}

/// Table mapping command ids to their apply/revert pairs.
#[derive(Default)]
pub struct CommandRegistry {
    entries: FxHashMap<CommandId, RegistryEntry>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.entries.len())
            .finish()
    }
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command type.
    ///
    /// Fails with a state error if the id is already registered in this
    /// registry, or if the id is not positive (non-positive ids are
    /// reserved for engine use).
    pub fn register<C: Apply>(&mut self) -> Result<()> {
        let command_id = C::ID;
        if command_id <= 0 {
            return Err(EngineError::State(format!(
                "command id {command_id} is reserved; author command ids must be positive"
            )));
        }
        if self.entries.contains_key(&command_id) {
            return Err(EngineError::State(format!(
                "command id {command_id} is already registered in this registry"
            )));
        }
        self.entries.insert(
            command_id,
            RegistryEntry {
                apply: apply_command::<C>,
                revert: revert_command::<C>,
            },
        );
        debug!(command_id, "registered command");
        Ok(())
    }

    /// Whether a command id is registered.
    #[must_use]
    pub fn contains(&self, command_id: CommandId) -> bool {
        self.entries.contains_key(&command_id)
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&self, command_id: CommandId) -> Option<&RegistryEntry> {
        self.entries.get(&command_id)
    }
}

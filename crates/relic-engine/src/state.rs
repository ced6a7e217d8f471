#![forbid(unsafe_code)]

//! State: domain model ownership, object-id minting, and linear
//! undo/redo history.
//!
//! Every mutation of the model goes through [`State::run`], which
//! dispatches the command through the registry, captures its result map,
//! and records `(command_id, args, result)` on the undo deque:
//!
//! ```text
//! run(cmd5)
//! ┌───────────────────────────────────────────────┐
//! │ Undo: [rec1, rec2, rec3, rec4, rec5]          │
//! │ Redo: []                                      │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo: [rec1, rec2, rec3]                      │
//! │ Redo: [rec4, rec5]                            │
//! └───────────────────────────────────────────────┘
//!
//! run(cmd6)  - new branch, clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo: [rec1, rec2, rec3, rec6]                │
//! │ Redo: []                                      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. A failed apply records nothing; undo/redo are untouched.
//! 2. Undo + redo together are one linear history: replaying every undo
//!    record in order against a fresh model reproduces the state.
//! 3. Redo replays with the *recorded* result map, frozen: commands
//!    consult it for previously minted ids instead of minting again.
//! 4. A record whose revert or redo-apply fails returns to the deque it
//!    was popped from, and the error propagates.
//!
//! # Concurrency
//!
//! A state is single-threaded with respect to command execution. Only the
//! object-id counter is atomic, so helper threads spawned by command
//! authors may mint ids concurrently.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use relic_core::{Map, ObjectId, SessionId};

use crate::command::{Apply, CommandId, CommandResults, ResultAccess};
use crate::error::{EngineError, Result};
use crate::model::Model;
use crate::registry::CommandRegistry;

/// Number of bits of an [`ObjectId`] holding the per-session counter.
const SESSION_SHIFT: u32 = 48;
/// Sessions are 14-bit: the top two bits of an id stay zero.
const MAX_SESSION: SessionId = 1 << 14;

/// Atomic allocator for session-partitioned object ids.
///
/// Ids are `(session << 48) | counter` with the counter starting at 1 and
/// never reused, so ids minted by distinct sessions cannot collide and
/// ids within a session are strictly increasing.
#[derive(Debug)]
pub struct ObjectIds {
    session_id: SessionId,
    next: AtomicI64,
}

impl ObjectIds {
    fn new(session_id: SessionId) -> Result<Self> {
        if session_id >= MAX_SESSION {
            return Err(EngineError::State(format!(
                "invalid session id {session_id}: session ids must fit in 14 bits"
            )));
        }
        Ok(Self {
            session_id,
            next: AtomicI64::new((i64::from(session_id) << SESSION_SHIFT) | 1),
        })
    }

    /// The session this allocator partitions ids for.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Mint the next object id.
    ///
    /// Fails with a state error once the session's 48-bit counter range
    /// is exhausted.
    pub fn next_object_id(&self) -> Result<ObjectId> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if (id >> SESSION_SHIFT) != i64::from(self.session_id) {
            return Err(EngineError::State(
                "reached the limit of available object ids for this session".into(),
            ));
        }
        Ok(id)
    }

    #[cfg(test)]
    fn with_counter(session_id: SessionId, counter: i64) -> Self {
        Self {
            session_id,
            next: AtomicI64::new((i64::from(session_id) << SESSION_SHIFT) | counter),
        }
    }
}

/// Services a command may use while applying.
pub struct ApplyCtx<'a> {
    ids: &'a ObjectIds,
}

impl ApplyCtx<'_> {
    /// Mint a fresh object id.
    ///
    /// Commands must record minted ids in their results and reuse them on
    /// replay; minting is only for the first apply.
    pub fn next_object_id(&self) -> Result<ObjectId> {
        self.ids.next_object_id()
    }

    /// The session id of the executing state.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.ids.session_id()
    }
}

/// One applied command as recorded in history: the command id plus
/// immutable argument and result maps.
struct CommandRecord {
    command_id: CommandId,
    args: Arc<Map>,
    result: Arc<Map>,
}

/// History configuration.
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Maximum number of records kept on the undo deque. Oldest records
    /// are evicted past this limit, which also forfeits full-history
    /// replay from an empty model.
    pub max_undo_depth: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl StateConfig {
    /// Keep the entire history (the default).
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_undo_depth: usize::MAX,
        }
    }

    /// Keep at most `max_undo_depth` undo records.
    #[must_use]
    pub fn bounded(max_undo_depth: usize) -> Self {
        Self { max_undo_depth }
    }
}

/// A domain model plus session identity, object-id allocation, and
/// command history.
pub struct State<M: Model> {
    ids: ObjectIds,
    registry: Arc<CommandRegistry>,
    model: M,
    undo: VecDeque<CommandRecord>,
    redo: VecDeque<CommandRecord>,
    config: StateConfig,
}

impl<M: Model> std::fmt::Debug for State<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("session_id", &self.ids.session_id())
            .field("undo_depth", &self.undo.len())
            .field("redo_depth", &self.redo.len())
            .finish()
    }
}

impl<M: Model> State<M> {
    /// Create a state for `model`.
    ///
    /// `session_id` must be unique among peers editing replicas of the
    /// same model concurrently (it partitions the object-id space) and
    /// must fit in 14 bits.
    pub fn new(session_id: SessionId, registry: Arc<CommandRegistry>, model: M) -> Result<Self> {
        Self::with_config(session_id, registry, model, StateConfig::default())
    }

    /// Create a state with an explicit history configuration.
    pub fn with_config(
        session_id: SessionId,
        registry: Arc<CommandRegistry>,
        model: M,
        config: StateConfig,
    ) -> Result<Self> {
        Ok(Self {
            ids: ObjectIds::new(session_id)?,
            registry,
            model,
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            config,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The session id this state mints object ids under.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.ids.session_id()
    }

    /// Mint a fresh object id; see [`ObjectIds::next_object_id`].
    pub fn next_object_id(&self) -> Result<ObjectId> {
        self.ids.next_object_id()
    }

    /// The domain model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the domain model.
    ///
    /// Mutations made here bypass history; prefer commands for anything
    /// that should be undoable or replayable.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Whether there is a command to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is an undone command to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of records on the undo deque.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of records on the redo deque.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    // ========================================================================
    // Running commands
    // ========================================================================

    /// Run a command and record it for undo.
    ///
    /// Returns the command's typed results. A failed apply leaves the
    /// model (per the authoring contract) and the history (guaranteed
    /// here) unchanged.
    pub fn run<C: Apply>(&mut self, command: &C) -> Result<C::Results> {
        let result = self.dispatch(C::ID, command.args(), true)?;
        Ok(C::Results::from_access(ResultAccess::frozen(result)))
    }

    /// Run a command without recording it.
    ///
    /// The command cannot be undone afterwards; the redo deque is left
    /// alone.
    pub fn run_transient<C: Apply>(&mut self, command: &C) -> Result<C::Results> {
        let result = self.dispatch(C::ID, command.args(), false)?;
        Ok(C::Results::from_access(ResultAccess::frozen(result)))
    }

    /// Execute a command received from a peer as `(command_id, args)`.
    ///
    /// Applies with a writable result map, records history, and returns
    /// the result map, equal to the originator's, provided the command
    /// is deterministic given the model and previously minted ids.
    pub fn run_dynamic(&mut self, command_id: CommandId, args: Arc<Map>) -> Result<Arc<Map>> {
        self.dispatch(command_id, args, true)
    }

    /// Re-execute a recorded `(command_id, args, result)` triple.
    ///
    /// The result map is frozen: the command must reproduce the original
    /// transition from it rather than recompute side effects. The record
    /// is added to this state's history, so a mirrored replica can undo
    /// just like the origin.
    pub fn replay(&mut self, command_id: CommandId, args: Arc<Map>, result: Arc<Map>) -> Result<()> {
        let entry = self
            .registry
            .entry(command_id)
            .ok_or(EngineError::Inapplicable)?;
        trace!(command_id, "replaying command");
        let ctx = ApplyCtx { ids: &self.ids };
        (entry.apply)(
            &mut self.model,
            &ctx,
            &args,
            ResultAccess::frozen(Arc::clone(&result)),
        )?;
        self.record(CommandRecord {
            command_id,
            args,
            result,
        });
        Ok(())
    }

    fn dispatch(&mut self, command_id: CommandId, args: Arc<Map>, record: bool) -> Result<Arc<Map>> {
        let entry = self
            .registry
            .entry(command_id)
            .ok_or(EngineError::Inapplicable)?;
        debug!(command_id, "running command");
        let ctx = ApplyCtx { ids: &self.ids };
        let access = (entry.apply)(&mut self.model, &ctx, &args, ResultAccess::first_apply())?;
        let result = access.into_map();
        if record {
            self.record(CommandRecord {
                command_id,
                args,
                result: Arc::clone(&result),
            });
        }
        Ok(result)
    }

    fn record(&mut self, record: CommandRecord) {
        self.undo.push_back(record);
        if !self.redo.is_empty() {
            self.redo.clear();
        }
        while self.undo.len() > self.config.max_undo_depth {
            self.undo.pop_front();
        }
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Undo the most recent command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. On a failed
    /// revert the record stays on the undo deque and the error
    /// propagates.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(record) = self.undo.pop_back() else {
            return Ok(false);
        };
        let Some(entry) = self.registry.entry(record.command_id) else {
            self.undo.push_back(record);
            return Err(EngineError::Inapplicable);
        };
        trace!(command_id = record.command_id, "undoing command");
        match (entry.revert)(&mut self.model, &record.args, &record.result) {
            Ok(()) => {
                self.redo.push_back(record);
                Ok(true)
            }
            Err(err) => {
                self.undo.push_back(record);
                Err(err)
            }
        }
    }

    /// Redo the most recently undone command.
    ///
    /// Replays the recorded command with its frozen result map. Returns
    /// `Ok(false)` when there is nothing to redo. On failure the record
    /// stays on the redo deque and the error propagates.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(record) = self.redo.pop_back() else {
            return Ok(false);
        };
        let Some(entry) = self.registry.entry(record.command_id) else {
            self.redo.push_back(record);
            return Err(EngineError::Inapplicable);
        };
        trace!(command_id = record.command_id, "redoing command");
        let ctx = ApplyCtx { ids: &self.ids };
        match (entry.apply)(
            &mut self.model,
            &ctx,
            &record.args,
            ResultAccess::frozen(Arc::clone(&record.result)),
        ) {
            Ok(_) => {
                self.undo.push_back(record);
                Ok(true)
            }
            Err(err) => {
                self.redo.push_back(record);
                Err(err)
            }
        }
    }
}

#![forbid(unsafe_code)]

//! Engine error taxonomy.
//!
//! The set is closed: every failure surfaced by `run`, `undo`, or `redo`
//! is one of these kinds. The engine recovers from none of them; a failed
//! apply never leaves a record in history.

use thiserror::Error;

use relic_core::ValueError;

/// Errors surfaced by command dispatch, history operations, and state
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The command id is unknown to the state's registry, or the state
    /// does not satisfy the command's target capability. No state change.
    #[error("that command is not applicable to that state")]
    Inapplicable,

    /// The command's preconditions failed against the current state.
    /// Raised by command authors from inside `apply`, before mutating.
    #[error("command will not apply: {0}")]
    WillNotApply(String),

    /// A result field was written outside the first apply. Authoring bug.
    #[error("result data may only be modified during the first apply")]
    ResultMisuse,

    /// Configuration or bookkeeping failure: duplicate registration,
    /// session id out of range, object-id exhaustion.
    #[error("state error: {0}")]
    State(String),

    /// Typed access to an argument or result field failed.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Engine result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

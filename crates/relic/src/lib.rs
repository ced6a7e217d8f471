#![forbid(unsafe_code)]

//! relic public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports the value model and the engine from the internal crates and
//! offers a lightweight prelude for day-to-day usage.
//!
//! ```ignore
//! use relic::prelude::*;
//!
//! struct FoodOrders {
//!     orders: i64,
//! }
//!
//! relic::model!(FoodOrders);
//!
//! relic::command! {
//!     /// Places one order.
//!     pub struct PlaceOrder: FoodOrders, id = 1;
//!     args {}
//! }
//!
//! impl Apply for PlaceOrder {
//!     fn apply(&self, orders: &mut FoodOrders, _ctx: &ApplyCtx<'_>,
//!              _results: &mut NoResults) -> relic::Result<()> {
//!         orders.orders += 1;
//!         Ok(())
//!     }
//!     fn revert(&self, orders: &mut FoodOrders, _results: &NoResults) -> relic::Result<()> {
//!         orders.orders -= 1;
//!         Ok(())
//!     }
//! }
//! ```

// --- Value model re-exports ------------------------------------------------

pub use relic_engine::{
    field_id, wrap, FieldId, FieldValue, IntList, List, Map, ObjectId, SessionId, StrList, StrMap,
    Value, ValueError, ValueTag,
};

// --- Engine re-exports -----------------------------------------------------

pub use relic_engine::{
    Apply, ApplyCtx, Capability, Command, CommandId, CommandRegistry, CommandResults, EngineError,
    Model, NoResults, ObjectIds, Result, ResultAccess, State, StateConfig,
};

// --- Declaration macros ----------------------------------------------------

pub use relic_engine::{capability, command, model, register_commands};

/// Commonly used imports for command authors.
pub mod prelude {
    pub use relic_engine::{
        field_id, wrap, Apply, ApplyCtx, Capability, Command, CommandId, CommandRegistry,
        CommandResults, EngineError, FieldId, FieldValue, IntList, List, Map, Model, NoResults,
        ObjectId, Result, ResultAccess, SessionId, State, StateConfig, StrList, StrMap, Value,
        ValueError, ValueTag,
    };
}

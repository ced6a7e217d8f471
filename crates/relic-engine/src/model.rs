#![forbid(unsafe_code)]

//! Domain models and the capabilities commands target.
//!
//! A [`Model`] is the application-owned domain data a state manages; the
//! engine treats it as opaque. Commands do not name a model type directly
//! at dispatch time; they name a [`Capability`], and dispatch asks the
//! capability whether the model at hand satisfies it. This is what lets
//! one registry serve a whole family of model types: a command declared
//! against a capability runs on every model that satisfies it, and is
//! rejected with an inapplicable-command error everywhere else.
//!
//! Two ways to satisfy:
//!
//! - Every sized model type is its own capability (blanket impl below), so
//!   a command may target one concrete model type.
//! - A trait object capability (`dyn Edible`) accepts each model type the
//!   author lists in a `capability!` declaration.
//!
//! Model hierarchies are expressed as capability traits rather than
//! subtyping: a "tree is a plant" relationship becomes two capability
//! traits, with tree models implementing both.

use std::any::Any;

/// Application-owned domain data managed by a
/// [`State`](crate::state::State).
///
/// The `as_any` pair powers capability acceptance; the `model!` macro
/// writes these two methods.
pub trait Model: Any {
    /// Borrow as [`Any`] for capability checks.
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as [`Any`] for capability acceptance.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A view of a model that a command may target.
///
/// `accept` returns the typed view when the model satisfies the
/// capability, or `None`, in which case dispatch fails with an
/// inapplicable-command error and nothing is mutated.
pub trait Capability {
    /// Typed view of `model` if it satisfies this capability.
    fn accept(model: &mut dyn Model) -> Option<&mut Self>;
}

// Every concrete model satisfies exactly itself.
impl<M: Model> Capability for M {
    fn accept(model: &mut dyn Model) -> Option<&mut Self> {
        model.as_any_mut().downcast_mut::<M>()
    }
}

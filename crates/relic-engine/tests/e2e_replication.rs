#![forbid(unsafe_code)]

//! Remote execution and recorded replay.
//!
//! A command on the wire is `(command_id, args)`; a recorded history
//! entry is `(command_id, args, result)`. Executing the former on a
//! replica produces the same result map as the origin; replaying the
//! latter reproduces the exact transition, minted ids included.

use std::collections::HashMap;
use std::sync::Arc;

use relic_engine::{
    wrap, Apply, ApplyCtx, Command, CommandRegistry, EngineError, FieldValue, ObjectId, Result,
    State, Value,
};

// ============================================================================
// A typed key-value model
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
pub struct KvStore {
    entries: HashMap<String, Value>,
}

impl KvStore {
    fn get(&self, key: &str) -> Value {
        self.entries.get(key).cloned().unwrap_or_default()
    }
}

relic_engine::model!(KvStore);

relic_engine::command! {
    /// Sets any of the supported scalar slots, remembering prior values.
    pub struct SetValue: KvStore, id = 1;
    args {
        bool_arg: bool => { get bool_arg, set set_bool_arg, has has_bool_arg };
        int32_arg: i32 => { get int32_arg, set set_int32_arg, has has_int32_arg };
        int64_arg: i64 => { get int64_arg, set set_int64_arg, has has_int64_arg };
        double_arg: f64 => { get double_arg, set set_double_arg, has has_double_arg };
        string_arg: String => { get string_arg, set set_string_arg, has has_string_arg };
    }
    results SetValueResults {
        bool_prev: bool => { get bool_prev, set set_bool_prev, has has_bool_prev };
        int32_prev: i32 => { get int32_prev, set set_int32_prev, has has_int32_prev };
        int64_prev: i64 => { get int64_prev, set set_int64_prev, has has_int64_prev };
        double_prev: f64 => { get double_prev, set set_double_prev, has has_double_prev };
        string_prev: String => { get string_prev, set set_string_prev, has has_string_prev };
    }
}

// One slot per scalar kind keeps the command small while exercising every
// accessor shape.
macro_rules! set_slot {
    ($cmd:expr, $store:expr, $results:expr, $key:literal, $ty:ty,
     $has_arg:ident, $get_arg:ident, $has_prev:ident, $set_prev:ident) => {
        if $cmd.$has_arg() {
            if let Some(prev) = $store.entries.get($key) {
                // Capture the prior value on the first apply only; replays
                // already carry it.
                if !$results.$has_prev() {
                    $results.$set_prev(<$ty as FieldValue>::unwrap(prev)?)?;
                }
            }
            $store
                .entries
                .insert($key.to_string(), wrap($cmd.$get_arg()?));
        }
    };
}

macro_rules! revert_slot {
    ($cmd:expr, $store:expr, $results:expr, $key:literal,
     $has_arg:ident, $has_prev:ident, $get_prev:ident) => {
        if $cmd.$has_arg() {
            if $results.$has_prev() {
                $store
                    .entries
                    .insert($key.to_string(), wrap($results.$get_prev()?));
            } else {
                $store.entries.remove($key);
            }
        }
    };
}

impl Apply for SetValue {
    fn apply(
        &self,
        store: &mut KvStore,
        _ctx: &ApplyCtx<'_>,
        results: &mut SetValueResults,
    ) -> Result<()> {
        set_slot!(self, store, results, "bool", bool, has_bool_arg, bool_arg, has_bool_prev, set_bool_prev);
        set_slot!(self, store, results, "int32", i32, has_int32_arg, int32_arg, has_int32_prev, set_int32_prev);
        set_slot!(self, store, results, "int64", i64, has_int64_arg, int64_arg, has_int64_prev, set_int64_prev);
        set_slot!(self, store, results, "double", f64, has_double_arg, double_arg, has_double_prev, set_double_prev);
        set_slot!(self, store, results, "string", String, has_string_arg, string_arg, has_string_prev, set_string_prev);
        Ok(())
    }

    fn revert(&self, store: &mut KvStore, results: &SetValueResults) -> Result<()> {
        revert_slot!(self, store, results, "bool", has_bool_arg, has_bool_prev, bool_prev);
        revert_slot!(self, store, results, "int32", has_int32_arg, has_int32_prev, int32_prev);
        revert_slot!(self, store, results, "int64", has_int64_arg, has_int64_prev, int64_prev);
        revert_slot!(self, store, results, "double", has_double_arg, has_double_prev, double_prev);
        revert_slot!(self, store, results, "string", has_string_arg, has_string_prev, string_prev);
        Ok(())
    }
}

relic_engine::command! {
    /// Mints one object id and stores it under a key.
    pub struct Mint: KvStore, id = 2;
    args {
        key: String => { get key, set set_key, has has_key };
    }
    results MintResults {
        minted: ObjectId => { get minted, set set_minted, has has_minted };
    }
}

impl Apply for Mint {
    fn apply(
        &self,
        store: &mut KvStore,
        ctx: &ApplyCtx<'_>,
        results: &mut MintResults,
    ) -> Result<()> {
        let id = if results.has_minted() {
            results.minted()?
        } else {
            let id = ctx.next_object_id()?;
            results.set_minted(id)?;
            id
        };
        store.entries.insert(self.key()?, wrap(id));
        Ok(())
    }

    fn revert(&self, store: &mut KvStore, _results: &MintResults) -> Result<()> {
        store.entries.remove(&self.key()?);
        Ok(())
    }
}

fn registry() -> Arc<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    relic_engine::register_commands!(&mut registry, SetValue, Mint).unwrap();
    Arc::new(registry)
}

// ============================================================================
// Local data-type behavior
// ============================================================================

#[test]
fn set_and_undo_all_scalar_kinds() {
    let mut state = State::new(10, registry(), KvStore::default()).unwrap();

    let mut first = SetValue::new();
    first.set_bool_arg(true).set_int32_arg(15_i32);
    state.run(&first).unwrap();
    assert_eq!(state.model().get("bool"), Value::Bool(true));
    assert_eq!(state.model().get("int32"), Value::I32(15));
    assert_eq!(state.model().get("int64"), Value::Unset);

    let mut second = SetValue::new();
    second
        .set_bool_arg(false)
        .set_int32_arg(0_i32)
        .set_int64_arg(-72_036_854_775_807_i64)
        .set_double_arg(3.40_f64)
        .set_string_arg("So say we all.".to_string());
    state.run(&second).unwrap();
    assert_eq!(state.model().get("bool"), Value::Bool(false));
    assert_eq!(state.model().get("int32"), Value::I32(0));
    assert_eq!(state.model().get("int64"), Value::I64(-72_036_854_775_807));
    assert_eq!(state.model().get("double"), Value::F64(3.40));
    assert_eq!(
        state.model().get("string"),
        Value::Str("So say we all.".to_string())
    );

    // Undo restores prior values where they existed and clears the rest.
    state.undo().unwrap();
    assert_eq!(state.model().get("bool"), Value::Bool(true));
    assert_eq!(state.model().get("int32"), Value::I32(15));
    assert_eq!(state.model().get("int64"), Value::Unset);
    assert_eq!(state.model().get("double"), Value::Unset);
    assert_eq!(state.model().get("string"), Value::Unset);
}

// ============================================================================
// Wire execution
// ============================================================================

#[test]
fn dynamic_execution_matches_local_run() {
    let mut origin = State::new(1, registry(), KvStore::default()).unwrap();
    let mut replica = State::new(2, registry(), KvStore::default()).unwrap();

    let mut cmd = SetValue::new();
    cmd.set_int64_arg(99_i64).set_string_arg("mirror".to_string());

    let local = origin.run_dynamic(SetValue::ID, cmd.args()).unwrap();
    let remote = replica.run_dynamic(SetValue::ID, cmd.args()).unwrap();

    assert_eq!(*local, *remote);
    assert_eq!(origin.model(), replica.model());
    // The replica recorded the command and can undo it like the origin.
    assert!(replica.can_undo());
    replica.undo().unwrap();
    assert_eq!(replica.model().get("int64"), Value::Unset);
}

#[test]
fn replay_reproduces_minted_ids() {
    let mut origin = State::new(1, registry(), KvStore::default()).unwrap();
    let mut replica = State::new(2, registry(), KvStore::default()).unwrap();

    let mut cmd = Mint::new();
    cmd.set_key("token".to_string());
    let result = origin.run_dynamic(Mint::ID, cmd.args()).unwrap();

    // The origin minted under session 1.
    let minted = origin.model().get("token");
    assert_eq!(minted, Value::I64((1_i64 << 48) | 1));

    // Replaying on the replica reuses the recorded id even though the
    // replica's own allocator lives in session 2.
    replica
        .replay(Mint::ID, cmd.args(), Arc::clone(&result))
        .unwrap();
    assert_eq!(origin.model(), replica.model());
    assert_eq!(replica.model().get("token"), Value::I64((1_i64 << 48) | 1));

    // The replica mirrors history too.
    assert!(replica.can_undo());
    replica.undo().unwrap();
    assert_eq!(replica.model().get("token"), Value::Unset);
    replica.redo().unwrap();
    assert_eq!(origin.model(), replica.model());
}

#[test]
fn replay_of_unknown_command_is_inapplicable() {
    let mut replica = State::new(2, Arc::new(CommandRegistry::new()), KvStore::default()).unwrap();
    let cmd = Mint::new();
    let err = replica
        .replay(Mint::ID, cmd.args(), Arc::new(relic_engine::Map::default()))
        .unwrap_err();
    assert_eq!(err, EngineError::Inapplicable);
}

#[test]
fn redo_respects_recorded_prior_values() {
    let mut origin = State::new(1, registry(), KvStore::default()).unwrap();
    let mut cmd = SetValue::new();
    cmd.set_bool_arg(true);
    origin.run(&cmd).unwrap();
    cmd.set_bool_arg(false);
    origin.run(&cmd).unwrap();

    // Undo then redo: the second apply runs against the frozen result and
    // must not try to overwrite the recorded prior value.
    origin.undo().unwrap();
    origin.redo().unwrap();
    assert_eq!(origin.model().get("bool"), Value::Bool(false));
}

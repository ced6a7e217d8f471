#![forbid(unsafe_code)]

//! Declaration macros: command schemas, capabilities, and models.
//!
//! Commands are declared, not hand-written: the [`command!`] macro turns a
//! schema (target, id, argument fields, result fields) into a struct whose
//! only field is the shared argument map, plus typed accessors that read
//! and write that map. Accessor names are part of the declaration (each
//! field lists its `get`/`set`/`has` method names explicitly), so the
//! macro never has to invent identifiers.
//!
//! The author then implements [`Apply`](crate::Apply) by hand for the
//! generated struct and registers it with
//! [`register_commands!`](crate::register_commands).

/// Declare a command type from its schema.
///
/// Generates the command struct (one field: the shared argument map), a
/// `new()` constructor, typed copy-on-write argument accessors, the
/// [`Command`](crate::Command) impl, and, when a `results` block is
/// present, the typed results façade implementing
/// [`CommandResults`](crate::CommandResults). Without a `results` block
/// the command uses [`NoResults`](crate::NoResults).
///
/// Field ids are the FNV-1a hashes of the declared field names, computed
/// at compile time. Choose distinct names within one command.
///
/// ```ignore
/// relic_engine::command! {
///     /// Funds the company, minting one ledger entry.
///     pub struct FundCompany: InventoryBook, id = 17;
///     args {
///         amount: f64 => { get amount, set set_amount, has has_amount };
///     }
///     results FundCompanyResults {
///         entry_id: ObjectId => { get entry_id, set set_entry_id, has has_entry_id };
///     }
/// }
///
/// impl Apply for FundCompany {
///     fn apply(&self, book: &mut InventoryBook, ctx: &ApplyCtx<'_>,
///              results: &mut FundCompanyResults) -> relic_engine::Result<()> {
///         // ...
///         Ok(())
///     }
///     fn revert(&self, book: &mut InventoryBook,
///               results: &FundCompanyResults) -> relic_engine::Result<()> {
///         // ...
///         Ok(())
///     }
/// }
/// ```
#[macro_export]
macro_rules! command {
    // Command with declared result fields.
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $target:ty , id = $id:expr ;
        args { $($args:tt)* }
        results $results:ident {
            $( $rname:ident : $rty:ty => { get $rget:ident, set $rset:ident, has $rhas:ident } ; )*
        }
    ) => {
        $crate::command!(@command $(#[$meta])* $vis $name : $target , $id , $results ; $($args)*);

        #[derive(Debug)]
        $vis struct $results {
            access: $crate::ResultAccess,
        }

        impl $crate::CommandResults for $results {
            fn from_access(access: $crate::ResultAccess) -> Self {
                Self { access }
            }

            fn into_access(self) -> $crate::ResultAccess {
                self.access
            }
        }

        impl $results {
            $( $crate::command!(@result_accessors $rname : $rty , $rget , $rset , $rhas); )*
        }
    };

    // Command without result fields.
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $target:ty , id = $id:expr ;
        args { $($args:tt)* }
    ) => {
        $crate::command!(@command $(#[$meta])* $vis $name : $target , $id , $crate::NoResults ; $($args)*);
    };

    // Internal: the command struct, its argument accessors, and the
    // Command impl.
    (@command
        $(#[$meta:meta])*
        $vis:vis $name:ident : $target:ty , $id:expr , $results:ty ;
        $( $aname:ident : $aty:ty => { get $aget:ident, set $aset:ident, has $ahas:ident } ; )*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            args: ::std::sync::Arc<$crate::Map>,
        }

        impl $name {
            /// Creates the command with an empty argument map.
            #[must_use]
            $vis fn new() -> Self {
                Self {
                    args: ::std::sync::Arc::new($crate::Map::default()),
                }
            }

            $( $crate::command!(@arg_accessors $aname : $aty , $aget , $aset , $ahas); )*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::Command for $name {
            const ID: $crate::CommandId = $id;
            type Target = $target;
            type Results = $results;

            fn from_args(args: ::std::sync::Arc<$crate::Map>) -> Self {
                Self { args }
            }

            fn args(&self) -> ::std::sync::Arc<$crate::Map> {
                ::std::sync::Arc::clone(&self.args)
            }
        }
    };

    // Internal: typed accessors for one argument field.
    (@arg_accessors $aname:ident : $aty:ty , $aget:ident , $aset:ident , $ahas:ident) => {
        pub fn $aget(&self) -> ::core::result::Result<$aty, $crate::ValueError> {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($aname));
            match self.args.get(&FIELD) {
                ::core::option::Option::Some(value) => {
                    <$aty as $crate::FieldValue>::unwrap(value)
                }
                ::core::option::Option::None => {
                    ::core::result::Result::Err($crate::ValueError::MissingField(FIELD))
                }
            }
        }

        pub fn $aset(&mut self, value: impl ::core::convert::Into<$aty>) -> &mut Self {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($aname));
            ::std::sync::Arc::make_mut(&mut self.args)
                .insert(FIELD, <$aty as $crate::FieldValue>::wrap(value.into()));
            self
        }

        pub fn $ahas(&self) -> bool {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($aname));
            self.args
                .get(&FIELD)
                .is_some_and(<$aty as $crate::FieldValue>::can_unwrap)
        }
    };

    // Internal: typed accessors for one result field.
    (@result_accessors $rname:ident : $rty:ty , $rget:ident , $rset:ident , $rhas:ident) => {
        pub fn $rget(&self) -> ::core::result::Result<$rty, $crate::ValueError> {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($rname));
            match self.access.get(FIELD) {
                ::core::option::Option::Some(value) => {
                    <$rty as $crate::FieldValue>::unwrap(value)
                }
                ::core::option::Option::None => {
                    ::core::result::Result::Err($crate::ValueError::MissingField(FIELD))
                }
            }
        }

        pub fn $rset(&mut self, value: impl ::core::convert::Into<$rty>) -> $crate::Result<()> {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($rname));
            self.access
                .set(FIELD, <$rty as $crate::FieldValue>::wrap(value.into()))
        }

        pub fn $rhas(&self) -> bool {
            const FIELD: $crate::FieldId = $crate::field_id(::core::stringify!($rname));
            self.access
                .get(FIELD)
                .is_some_and(<$rty as $crate::FieldValue>::can_unwrap)
        }
    };
}

/// Declare which model types satisfy a trait-object capability.
///
/// Expands to the [`Capability`](crate::Capability) impl for
/// `dyn Trait`, accepting exactly the listed model types. Each listed
/// type must implement both the trait and [`Model`](crate::Model).
///
/// ```ignore
/// trait Edible {
///     fn bites(&mut self) -> &mut u32;
/// }
///
/// relic_engine::capability!(Edible for Potato, Carrot);
/// ```
#[macro_export]
macro_rules! capability {
    ( $cap:ident for $( $model:ty ),+ $(,)? ) => {
        impl $crate::Capability for dyn $cap {
            fn accept(model: &mut dyn $crate::Model) -> ::core::option::Option<&mut Self> {
                $(
                    if $crate::Model::as_any_mut(model).is::<$model>() {
                        return $crate::Model::as_any_mut(model)
                            .downcast_mut::<$model>()
                            .map(|typed| typed as &mut Self);
                    }
                )+
                ::core::option::Option::None
            }
        }
    };
}

/// Implement [`Model`](crate::Model) for one or more domain types.
///
/// ```ignore
/// struct FoodOrders {
///     orders: i64,
/// }
///
/// relic_engine::model!(FoodOrders);
/// ```
#[macro_export]
macro_rules! model {
    ( $( $ty:ty ),+ $(,)? ) => {$(
        impl $crate::Model for $ty {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    )+};
}

/// Register several command types with a registry, stopping at the first
/// failure.
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// relic_engine::register_commands!(&mut registry, FundCompany, Purchase)?;
/// ```
#[macro_export]
macro_rules! register_commands {
    ( $registry:expr , $( $command:ty ),+ $(,)? ) => {{
        let registry = $registry;
        let mut outcome: $crate::Result<()> = ::core::result::Result::Ok(());
        $(
            if outcome.is_ok() {
                outcome = registry.register::<$command>();
            }
        )+
        outcome
    }};
}

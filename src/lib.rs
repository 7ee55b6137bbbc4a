//! WebAssembly table instances and the machinery around them.
//!
//! A [`Table`] is a growable, bounds-checked vector of [`Ref`]s whose size is bounded by the
//! limits it was declared with. Every index, offset and length handed to a table is checked
//! against its current size before any element is touched, so the rest of the engine can turn
//! the resulting [`OutOfBounds`] error straight into a guest-visible trap.
//!
//! Around the table itself this crate provides what's needed to get tables into and out of a
//! module: [`Module`] translation of the table-related sections, a [`Store`] owning the table
//! instances, a [`Linker`] resolving table imports, and the [`builtins`] that implement the
//! table instructions on top of the bounds-checked primitives.
#![cfg_attr(feature = "no_std", no_std)]

extern crate alloc;
extern crate core;

pub mod builtins;
mod const_eval;
mod errors;
mod indices;
mod instance;
mod linker;
mod module;
mod store;
mod table;
mod translate;
mod traps;
mod types;
mod utils;
mod values;

pub use const_eval::{ConstExprEvaluator, ConstVal};
pub use errors::{Error, OutOfBounds};
pub use indices::{
    ElemIndex, ExternIndex, FuncIndex, GlobalIndex, InstanceIndex, TableAddr, TableIndex,
};
pub use instance::{Export, Instance};
pub use linker::Linker;
pub use module::Module;
pub use store::Store;
pub use table::Table;
pub use translate::{
    ConstExpr, ConstOp, EntityType, Import, ModuleTranslator, TableInitialValue, TableInitializers,
    TableSegment, TableSegmentElements, TranslatedModule,
};
pub use traps::Trap;
pub use types::{Limits, TableType};
pub use values::Ref;

pub type Result<T> = core::result::Result<T, Error>;

/// The largest number of elements a 32-bit table can ever hold.
///
/// Tables without a declared maximum are bounded by this value.
pub const WASM32_MAX_TABLE_SIZE: u32 = u32::MAX;

/// Value returned by [`builtins::table_grow`] when the table could not be grown.
///
/// This is the `-1` of the `table.grow` instruction reinterpreted as an unsigned integer.
pub const GROW_FAILED: u32 = u32::MAX;

mod const_expr;
mod module_translator;

use crate::indices::{ElemIndex, FuncIndex, TableIndex};
use crate::types::TableType;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use cranelift_entity::PrimaryMap;
use hashbrown::HashMap;
use wasmparser::ExternalKind;

pub use const_expr::{ConstExpr, ConstOp};
pub use module_translator::ModuleTranslator;

/// The table-related parts of a WebAssembly module.
#[derive(Debug, Default)]
pub struct TranslatedModule {
    pub table_plans: PrimaryMap<TableIndex, TableType>,

    // Instead of storing element segments as-is like the WebAssembly spec does, we split them
    // up into active and passive initializers.
    // Active initializers are executed when the module is instantiated while passive initializers
    // are kept around and *may* be executed by table.init instructions.
    pub table_initializers: TableInitializers,
    pub passive_table_initializers: HashMap<ElemIndex, TableSegmentElements>,

    pub imports: Vec<Import>,
    pub exports: HashMap<String, TableIndex>,

    pub num_imported_tables: u32,
}

impl TranslatedModule {
    #[inline]
    pub fn is_imported_table(&self, index: TableIndex) -> bool {
        index.as_u32() < self.num_imported_tables
    }

    /// Iterates over the tables this module defines itself, as opposed to importing them.
    pub fn defined_tables(&self) -> impl Iterator<Item = (TableIndex, &TableType)> + '_ {
        self.table_plans
            .iter()
            .filter(|(index, _)| !self.is_imported_table(*index))
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    /// Name of this import
    pub module: String,
    /// The field name projection of this import
    pub name: String,
    /// Where this import will be placed, which also has type information
    /// about the import.
    pub ty: EntityType,
}

/// The type of an imported entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    /// An imported table, the index points into `TranslatedModule::table_plans`.
    Table(TableIndex),
    /// Any other kind of import. These are recorded but can't be resolved by this crate.
    Other(ExternalKind),
}

#[derive(Debug, Default)]
pub struct TableInitializers {
    /// The initial value of each defined table, in definition order.
    pub initial_values: Vec<(TableIndex, TableInitialValue)>,
    pub segments: Vec<TableSegment>,
}

#[derive(Debug, Clone)]
pub enum TableInitialValue {
    RefNull,
    ConstExpr(ConstExpr),
}

#[derive(Debug, Clone)]
pub struct TableSegment {
    pub table_index: TableIndex,
    pub offset: ConstExpr,
    pub elements: TableSegmentElements,
}

#[derive(Debug, Clone)]
pub enum TableSegmentElements {
    Functions(Box<[FuncIndex]>),
    Expressions(Box<[ConstExpr]>),
}

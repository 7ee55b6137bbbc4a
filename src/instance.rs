use crate::const_eval::ConstExprEvaluator;
use crate::indices::{ElemIndex, InstanceIndex, TableAddr, TableIndex};
use crate::module::Module;
use crate::store::Store;
use crate::table::Table;
use crate::translate::TableInitialValue;
use crate::translate::TableSegmentElements;
use crate::utils::usize_from;
use crate::values::Ref;
use crate::{wasm_unsupported, Error};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use cranelift_entity::PrimaryMap;
use hashbrown::HashMap;

/// An instantiated module, as far as its tables are concerned.
///
/// This is a handle into the [`Store`] the instance was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instance(InstanceIndex);

/// A table exported by an instance.
#[derive(Debug, Clone, Copy)]
pub struct Export<'a> {
    pub name: &'a str,
    pub table: TableAddr,
}

#[derive(Debug)]
pub(crate) struct InstanceData {
    tables: PrimaryMap<TableIndex, TableAddr>,
    /// Passive element segments that have not been dropped yet.
    passive_elements: HashMap<ElemIndex, Box<[Ref]>>,
    exports: HashMap<String, TableIndex>,
}

impl Instance {
    /// Instantiates the tables of `module`.
    ///
    /// `imports` are the addresses of the imported tables, in import order. They must already
    /// be type-checked against the module's imports.
    pub(crate) fn new(
        store: &mut Store,
        const_eval: &mut ConstExprEvaluator,
        module: &Module,
        imports: Vec<TableAddr>,
    ) -> crate::Result<Self> {
        let translated = module.translated();
        if imports.len() != usize_from(translated.num_imported_tables) {
            return Err(wasm_unsupported!(
                "expected {} table imports, got {}",
                translated.num_imported_tables,
                imports.len()
            ));
        }

        let mut tables = PrimaryMap::with_capacity(translated.table_plans.len());
        for addr in imports {
            tables.push(addr);
        }
        for (index, ty) in translated.defined_tables() {
            let addr = store.push_table(ty);
            let pushed = tables.push(addr);
            debug_assert_eq!(pushed, index);
        }

        for (index, init) in &translated.table_initializers.initial_values {
            let value = match init {
                // tables start out null-filled
                TableInitialValue::RefNull => continue,
                TableInitialValue::ConstExpr(expr) => const_eval.eval_ref(expr)?,
            };
            let table = lookup_mut(store, &tables, *index)?;
            let size = table.size();
            table.fill_slice(value, 0, size)?;
        }

        // active segments are applied in order and dropped right after
        for (i, segment) in translated.table_initializers.segments.iter().enumerate() {
            let items = eval_elements(const_eval, &segment.elements)?;
            let offset = const_eval.eval_offset(&segment.offset)?;
            let len = u32::try_from(items.len())
                .map_err(|_| wasm_unsupported!("element segment with {} items", items.len()))?;

            let table = lookup_mut(store, &tables, segment.table_index)?;
            if let Err(err) = table.write_slice(&items, offset, 0, len) {
                tracing::debug!(
                    "active element segment #{i} does not fit into table {}",
                    segment.table_index.as_u32()
                );
                return Err(err.into());
            }
        }

        let passive_elements = translated
            .passive_table_initializers
            .iter()
            .map(|(index, elements)| Ok((*index, eval_elements(const_eval, elements)?)))
            .collect::<crate::Result<HashMap<_, _>>>()?;

        let index = store.push_instance(InstanceData {
            tables,
            passive_elements,
            exports: translated.exports.clone(),
        });
        tracing::trace!("instantiated instance {}", index.as_u32());

        Ok(Self(index))
    }

    /// Returns the store address of the table at `index` in this instance's index space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if the instance has no such table.
    pub fn table_addr(self, store: &Store, index: TableIndex) -> crate::Result<TableAddr> {
        self.data(store)?
            .tables
            .get(index)
            .copied()
            .ok_or(Error::UnknownTable(index))
    }

    /// Returns the exported table `name`, if there is one.
    pub fn get_table(self, store: &Store, name: &str) -> Option<TableAddr> {
        let data = self.data(store).ok()?;
        let index = data.exports.get(name)?;
        data.tables.get(*index).copied()
    }

    /// Iterates over the tables exported by this instance.
    pub fn exports(self, store: &Store) -> impl Iterator<Item = Export<'_>> + '_ {
        self.data(store).ok().into_iter().flat_map(|data| {
            data.exports.iter().filter_map(move |(name, index)| {
                Some(Export {
                    name: name.as_str(),
                    table: *data.tables.get(*index)?,
                })
            })
        })
    }

    /// Borrows the items of the passive element segment `elem` together with the table at
    /// `index`.
    ///
    /// Dropped, declared and active segments have no items.
    pub(crate) fn elements_and_table(
        self,
        store: &mut Store,
        elem: ElemIndex,
        index: TableIndex,
    ) -> crate::Result<(&[Ref], &mut Table)> {
        let addr = self.table_addr(store, index)?;
        let (data, table) = store
            .instance_data_and_table_mut(self.0, addr)
            .ok_or(Error::UnknownTable(index))?;
        Ok((data.passive_elements(elem), table))
    }

    pub(crate) fn drop_elements(self, store: &mut Store, elem: ElemIndex) -> crate::Result<()> {
        store
            .instance_data_mut(self.0)
            .ok_or(Error::UnknownInstance)?
            .passive_elements
            .remove(&elem);
        Ok(())
    }

    fn data(self, store: &Store) -> crate::Result<&InstanceData> {
        store.instance_data(self.0).ok_or(Error::UnknownInstance)
    }
}

impl InstanceData {
    fn passive_elements(&self, elem: ElemIndex) -> &[Ref] {
        self.passive_elements
            .get(&elem)
            .map_or(&[][..], |items| &items[..])
    }
}

fn lookup_mut<'a>(
    store: &'a mut Store,
    tables: &PrimaryMap<TableIndex, TableAddr>,
    index: TableIndex,
) -> crate::Result<&'a mut Table> {
    let addr = tables.get(index).ok_or(Error::UnknownTable(index))?;
    store.table_mut(*addr).ok_or(Error::UnknownTable(index))
}

fn eval_elements(
    const_eval: &mut ConstExprEvaluator,
    elements: &TableSegmentElements,
) -> crate::Result<Box<[Ref]>> {
    match elements {
        TableSegmentElements::Functions(funcs) => {
            Ok(funcs.iter().map(|index| Ref::Func(*index)).collect())
        }
        TableSegmentElements::Expressions(exprs) => {
            exprs.iter().map(|expr| const_eval.eval_ref(expr)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::Linker;
    use wasmparser::Validator;

    #[test_log::test]
    fn segment_items_are_borrowed_in_place() {
        let mut validator = Validator::new();
        let module = Module::from_wat(
            &mut validator,
            r#"
            (module
                (table 1 funcref)
                (func $a)
                (elem func $a $a $a))
            "#,
        )
        .unwrap();

        let mut store = Store::new();
        let instance = Linker::new().instantiate(&mut store, &module).unwrap();
        let elem = ElemIndex::from_u32(0);
        let table = TableIndex::from_u32(0);

        let (items, _) = instance
            .elements_and_table(&mut store, elem, table)
            .unwrap();
        assert_eq!(items.len(), 3);
        let borrowed = items.as_ptr();

        let stored = store.instance_data(instance.0).unwrap();
        assert_eq!(stored.passive_elements(elem).as_ptr(), borrowed);

        instance.drop_elements(&mut store, elem).unwrap();
        let (items, _) = instance
            .elements_and_table(&mut store, elem, table)
            .unwrap();
        assert!(items.is_empty());
    }
}

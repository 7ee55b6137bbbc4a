use crate::const_eval::ConstExprEvaluator;
use crate::indices::TableAddr;
use crate::instance::Instance;
use crate::module::Module;
use crate::store::Store;
use crate::translate::EntityType;
use crate::{wasm_unsupported, Error};
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

/// Resolves the table imports of modules by `module`/`name` pairs.
#[derive(Debug, Default)]
pub struct Linker {
    string2idx: HashMap<Arc<str>, usize>,
    strings: Vec<Arc<str>>,
    map: HashMap<ImportKey, TableAddr>,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
struct ImportKey {
    name: usize,
    module: usize,
}

impl Linker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &str, name: &str) -> Option<TableAddr> {
        let key = ImportKey {
            module: *self.string2idx.get(module)?,
            name: *self.string2idx.get(name)?,
        };
        self.map.get(&key).copied()
    }

    /// Makes the table at `addr` available as `module::name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDefinition`] if `module::name` is already defined.
    pub fn define_table(
        &mut self,
        module: &str,
        name: &str,
        addr: TableAddr,
    ) -> crate::Result<&mut Self> {
        let key = self.import_key(module, name);
        self.insert(key, addr)?;
        Ok(self)
    }

    /// Defines every table exported by `instance` under `module_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDefinition`] if one of the exports is already defined.
    pub fn define_instance(
        &mut self,
        store: &Store,
        module_name: &str,
        instance: Instance,
    ) -> crate::Result<&mut Self> {
        let exports = instance
            .exports(store)
            .map(|e| (self.import_key(module_name, e.name), e.table))
            .collect::<Vec<_>>();

        for (key, addr) in exports {
            self.insert(key, addr)?;
        }

        Ok(self)
    }

    /// Resolves the imports of `module` and instantiates it into `store`.
    ///
    /// A provided table matches an import if its *current* size and maximum satisfy the
    /// limits the module declares, and the element types are equal.
    ///
    /// # Errors
    ///
    /// Returns an error if an import is missing or incompatible, if the module imports
    /// anything other than tables, or if instantiation itself fails.
    pub fn instantiate(&self, store: &mut Store, module: &Module) -> crate::Result<Instance> {
        let mut imports = Vec::with_capacity(module.imports().len());
        for import in module.imports() {
            let EntityType::Table(index) = import.ty else {
                return Err(wasm_unsupported!(
                    "import {}::{} of kind {:?}",
                    import.module,
                    import.name,
                    import.ty
                ));
            };

            let addr = self
                .get(&import.module, &import.name)
                .ok_or_else(|| Error::UnknownImport {
                    module: import.module.clone(),
                    name: import.name.clone(),
                })?;

            let expected = module
                .table_type(index)
                .ok_or(Error::UnknownTable(index))?;
            let actual = store
                .table(addr)
                .ok_or(Error::UnknownTable(index))?
                .ty();

            if !actual.matches(expected) {
                tracing::debug!(
                    "import {}::{} expected {expected}, found {actual}",
                    import.module,
                    import.name
                );
                return Err(Error::IncompatibleImport {
                    module: import.module.clone(),
                    name: import.name.clone(),
                    expected: *expected,
                    actual,
                });
            }

            imports.push(addr);
        }

        let mut const_eval = ConstExprEvaluator::default();
        Instance::new(store, &mut const_eval, module, imports)
    }

    fn insert(&mut self, key: ImportKey, addr: TableAddr) -> crate::Result<()> {
        match self.map.entry(key) {
            Entry::Occupied(_) => Err(Error::DuplicateDefinition {
                module: self.strings[key.module].to_string(),
                name: self.strings[key.name].to_string(),
            }),
            Entry::Vacant(v) => {
                v.insert(addr);
                Ok(())
            }
        }
    }

    fn import_key(&mut self, module: &str, name: &str) -> ImportKey {
        ImportKey {
            module: self.intern_str(module),
            name: self.intern_str(name),
        }
    }

    fn intern_str(&mut self, string: &str) -> usize {
        if let Some(idx) = self.string2idx.get(string) {
            return *idx;
        }
        let string: Arc<str> = string.into();
        let idx = self.strings.len();
        self.strings.push(string.clone());
        self.string2idx.insert(string, idx);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Limits, TableType};
    use wasmparser::RefType;

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut store = Store::new();
        let addr = store.push_table(&TableType::new(
            RefType::FUNCREF,
            Limits {
                minimum: 1,
                maximum: None,
            },
        ));

        let mut linker = Linker::new();
        linker.define_table("env", "table", addr).unwrap();
        assert_eq!(linker.get("env", "table"), Some(addr));
        assert_eq!(linker.get("env", "other"), None);

        let err = linker.define_table("env", "table", addr).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDefinition { module, name } if module == "env" && name == "table"
        ));
    }
}

use crate::indices::TableIndex;
use crate::translate::{Import, ModuleTranslator, TranslatedModule};
use crate::types::TableType;
use alloc::sync::Arc;
use wasmparser::Validator;

/// A validated WebAssembly module, reduced to what instantiating its tables needs.
///
/// Cloning a `Module` is cheap.
#[derive(Debug, Clone)]
pub struct Module(Arc<TranslatedModule>);

impl Module {
    /// Parses and validates a module in the WebAssembly text format.
    ///
    /// # Errors
    ///
    /// Returns an error if the text can't be parsed or the resulting module is invalid.
    pub fn from_wat(validator: &mut Validator, str: &str) -> crate::Result<Self> {
        Self::from_bytes(validator, &wat::parse_str(str)?)
    }

    /// Parses and validates a binary WebAssembly module.
    ///
    /// # Errors
    ///
    /// Returns an error if the module is invalid or uses unsupported features.
    pub fn from_bytes(validator: &mut Validator, bytes: &[u8]) -> crate::Result<Self> {
        tracing::trace!("Parsing WASM module...");

        let translated = ModuleTranslator::new(validator).translate(bytes)?;
        Ok(Self(Arc::new(translated)))
    }

    pub fn imports(&self) -> impl ExactSizeIterator<Item = &Import> {
        self.0.imports.iter()
    }

    /// Iterates over the exported tables of this module.
    pub fn exports(&self) -> impl ExactSizeIterator<Item = (&str, TableIndex)> + '_ {
        self.0
            .exports
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
    }

    /// Returns the declared type of the table at `index`.
    pub fn table_type(&self, index: TableIndex) -> Option<&TableType> {
        self.0.table_plans.get(index)
    }

    pub fn translated(&self) -> &TranslatedModule {
        &self.0
    }
}

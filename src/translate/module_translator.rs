use crate::indices::{ElemIndex, FuncIndex, TableIndex};
use crate::translate::const_expr::ConstExpr;
use crate::translate::{
    EntityType, Import, TableInitialValue, TableSegment, TableSegmentElements, TranslatedModule,
};
use crate::types::TableType;
use crate::wasm_unsupported;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::mem;
use wasmparser::{
    ElementItems, ElementKind, ElementSectionReader, ExportSectionReader, ExternalKind,
    FuncValidatorAllocations, ImportSectionReader, Parser, Payload, TableInit,
    TableSectionReader, TypeRef, Validator,
};

/// Validates a WebAssembly module and extracts everything tables need from it.
pub struct ModuleTranslator<'a> {
    result: TranslatedModule,
    validator: &'a mut Validator,
    allocations: FuncValidatorAllocations,
}

impl<'a> ModuleTranslator<'a> {
    pub fn new(validator: &'a mut Validator) -> Self {
        Self {
            result: TranslatedModule::default(),
            validator,
            allocations: FuncValidatorAllocations::default(),
        }
    }

    /// Validates and translates the binary module `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the module is invalid or uses features this crate does not support.
    pub fn translate(mut self, data: &[u8]) -> crate::Result<TranslatedModule> {
        let mut parser = Parser::default();
        parser.set_features(*self.validator.features());

        for payload in parser.parse_all(data) {
            self.translate_payload(payload?)?;
        }

        self.validator.reset();
        Ok(self.result)
    }

    /// Validates and translates a single payload of a module.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is invalid or not supported.
    pub fn translate_payload(&mut self, payload: Payload<'_>) -> crate::Result<()> {
        match payload {
            Payload::Version {
                num,
                encoding,
                range,
            } => {
                self.validator.version(num, encoding, &range)?;
            }
            Payload::End(offset) => {
                self.validator.end(offset)?;
            }
            Payload::TypeSection(types) => {
                self.validator.type_section(&types)?;
            }
            Payload::ImportSection(imports) => {
                self.validator.import_section(&imports)?;
                self.read_import_section(imports)?;
            }
            Payload::FunctionSection(functions) => {
                self.validator.function_section(&functions)?;
            }
            Payload::TableSection(tables) => {
                self.validator.table_section(&tables)?;
                self.read_table_section(tables)?;
            }
            Payload::MemorySection(memories) => {
                self.validator.memory_section(&memories)?;
            }
            Payload::TagSection(tags) => {
                self.validator.tag_section(&tags)?;
            }
            Payload::GlobalSection(globals) => {
                self.validator.global_section(&globals)?;
            }
            Payload::ExportSection(exports) => {
                self.validator.export_section(&exports)?;
                self.read_export_section(exports)?;
            }
            Payload::StartSection { func, range } => {
                self.validator.start_section(func, &range)?;
            }
            Payload::ElementSection(elements) => {
                self.validator.element_section(&elements)?;
                self.read_element_section(elements)?;
            }
            Payload::DataCountSection { count, range } => {
                self.validator.data_count_section(count, &range)?;
            }
            Payload::DataSection(section) => {
                self.validator.data_section(&section)?;
            }
            Payload::CodeSectionStart { count, range, .. } => {
                self.validator.code_section_start(count, &range)?;
            }
            Payload::CodeSectionEntry(body) => {
                let func = self.validator.code_section_entry(&body)?;
                let mut validator = func.into_validator(mem::take(&mut self.allocations));
                validator.validate(&body)?;
                self.allocations = validator.into_allocations();
            }
            Payload::CustomSection(sec) => {
                tracing::trace!("skipping custom section {}", sec.name());
            }
            Payload::ModuleSection { .. }
            | Payload::InstanceSection(_)
            | Payload::CoreTypeSection(_)
            | Payload::ComponentSection { .. }
            | Payload::ComponentInstanceSection(_)
            | Payload::ComponentAliasSection(_)
            | Payload::ComponentTypeSection(_)
            | Payload::ComponentCanonicalSection(_)
            | Payload::ComponentStartSection { .. }
            | Payload::ComponentImportSection(_)
            | Payload::ComponentExportSection(_) => {
                return Err(wasm_unsupported!("component module"));
            }
            p => {
                // let the validator decide whether this is fatal
                self.validator.payload(&p)?;
                tracing::warn!("unknown section {p:?}");
            }
        }

        Ok(())
    }

    fn read_import_section(&mut self, imports: ImportSectionReader<'_>) -> crate::Result<()> {
        self.result.imports.reserve_exact(imports.count() as usize);

        for import in imports {
            let import = import?;
            let ty = match import.ty {
                TypeRef::Table(ty) => {
                    self.result.num_imported_tables += 1;
                    EntityType::Table(self.result.table_plans.push(TableType::try_from(ty)?))
                }
                TypeRef::Func(_) => EntityType::Other(ExternalKind::Func),
                TypeRef::Memory(_) => EntityType::Other(ExternalKind::Memory),
                TypeRef::Global(_) => EntityType::Other(ExternalKind::Global),
                TypeRef::Tag(_) => EntityType::Other(ExternalKind::Tag),
            };

            self.result.imports.push(Import {
                module: import.module.to_string(),
                name: import.name.to_string(),
                ty,
            });
        }

        Ok(())
    }

    fn read_table_section(&mut self, tables: TableSectionReader<'_>) -> crate::Result<()> {
        self.result
            .table_plans
            .reserve_exact(tables.count() as usize);
        self.result
            .table_initializers
            .initial_values
            .reserve_exact(tables.count() as usize);

        for table in tables {
            let table = table?;
            let index = self.result.table_plans.push(TableType::try_from(table.ty)?);

            let init = match table.init {
                TableInit::RefNull => TableInitialValue::RefNull,
                TableInit::Expr(expr) => {
                    TableInitialValue::ConstExpr(ConstExpr::from_wasmparser(expr)?)
                }
            };
            self.result
                .table_initializers
                .initial_values
                .push((index, init));
        }

        tracing::trace!(
            defined = self.result.table_initializers.initial_values.len(),
            imported = self.result.num_imported_tables,
            "read table section"
        );

        Ok(())
    }

    fn read_export_section(&mut self, exports: ExportSectionReader<'_>) -> crate::Result<()> {
        for export in exports {
            let export = export?;
            if export.kind == ExternalKind::Table {
                self.result
                    .exports
                    .insert(export.name.to_string(), TableIndex::from_u32(export.index));
            }
        }

        Ok(())
    }

    fn read_element_section(&mut self, elements: ElementSectionReader<'_>) -> crate::Result<()> {
        for (elem_index, element) in elements.into_iter().enumerate() {
            let element = element?;
            let elem_index = u32::try_from(elem_index)
                .map(ElemIndex::from_u32)
                .map_err(|_| wasm_unsupported!("too many element segments"))?;

            let elements = match element.items {
                ElementItems::Functions(funcs) => {
                    let mut out = Vec::with_capacity(funcs.count() as usize);
                    for func_idx in funcs {
                        out.push(FuncIndex::from_u32(func_idx?));
                    }
                    TableSegmentElements::Functions(out.into_boxed_slice())
                }
                ElementItems::Expressions(_, exprs) => {
                    let mut out = Vec::with_capacity(exprs.count() as usize);
                    for expr in exprs {
                        out.push(ConstExpr::from_wasmparser(expr?)?);
                    }
                    TableSegmentElements::Expressions(out.into_boxed_slice())
                }
            };

            match element.kind {
                ElementKind::Active {
                    table_index,
                    offset_expr,
                } => {
                    let table_index = TableIndex::from_u32(table_index.unwrap_or(0));
                    let offset = ConstExpr::from_wasmparser(offset_expr)?;

                    self.result.table_initializers.segments.push(TableSegment {
                        table_index,
                        offset,
                        elements,
                    });
                }
                ElementKind::Passive => {
                    self.result
                        .passive_table_initializers
                        .insert(elem_index, elements);
                }
                // declared segments start out dropped, table.init treats them as empty
                ElementKind::Declared => {}
            }
        }

        Ok(())
    }
}

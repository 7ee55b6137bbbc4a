use crate::indices::TableIndex;
use crate::traps::Trap;
use crate::types::TableType;
use alloc::string::String;
use core::fmt;

#[derive(Debug)]
pub enum Error {
    /// The input WebAssembly code is invalid.
    ///
    /// This error is produced while translating a module when it encounters invalid WebAssembly
    /// code, including code that fails validation.
    InvalidWebAssembly {
        /// A string describing the validation error.
        message: String,
        /// The bytecode offset where the error occurred.
        offset: usize,
    },
    /// Failed to parse a module in the text format.
    Wat(wat::Error),
    /// The WebAssembly code used an unsupported feature.
    Unsupported(String),
    /// A table access was out of bounds.
    TableOutOfBounds(OutOfBounds),
    /// A WebAssembly trap ocurred.
    Trap(Trap),
    /// A module imports something no linker definition provides.
    UnknownImport { module: String, name: String },
    /// A module imports a table whose type is incompatible with the provided definition.
    IncompatibleImport {
        module: String,
        name: String,
        /// The type declared by the importing module.
        expected: TableType,
        /// The current type of the table that was provided.
        actual: TableType,
    },
    /// The same `module`/`name` pair was defined twice in a linker.
    DuplicateDefinition { module: String, name: String },
    /// A table index that doesn't refer to a table of the instance.
    UnknownTable(TableIndex),
    /// An instance handle that doesn't belong to the store it was used with.
    UnknownInstance,
}

impl Error {
    /// Returns the trap this error represents, if any.
    ///
    /// Translation and linking errors are not traps and return `None`.
    pub fn as_trap(&self) -> Option<Trap> {
        match self {
            Error::TableOutOfBounds(_) => Some(Trap::TableOutOfBounds),
            Error::Trap(trap) => Some(*trap),
            _ => None,
        }
    }
}

impl From<wasmparser::BinaryReaderError> for Error {
    fn from(e: wasmparser::BinaryReaderError) -> Self {
        Self::InvalidWebAssembly {
            message: e.message().into(),
            offset: e.offset(),
        }
    }
}

impl From<wat::Error> for Error {
    fn from(e: wat::Error) -> Self {
        Self::Wat(e)
    }
}

impl From<OutOfBounds> for Error {
    fn from(e: OutOfBounds) -> Self {
        Self::TableOutOfBounds(e)
    }
}

impl From<Trap> for Error {
    fn from(trap: Trap) -> Self {
        Self::Trap(trap)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidWebAssembly { message, offset } => {
                f.write_fmt(format_args!("invalid WASM input at {offset}: {message}"))
            }
            Error::Wat(e) => f.write_fmt(format_args!("failed to parse WAT input: {e}")),
            Error::Unsupported(feature) => f.write_fmt(format_args!(
                "Feature used by the WebAssembly code is not supported: {feature}"
            )),
            Error::TableOutOfBounds(e) => fmt::Display::fmt(e, f),
            Error::Trap(trap) => f.write_fmt(format_args!("wasm trap: {trap}")),
            Error::UnknownImport { module, name } => {
                f.write_fmt(format_args!("unknown import {module}::{name}"))
            }
            Error::IncompatibleImport {
                module,
                name,
                expected,
                actual,
            } => f.write_fmt(format_args!(
                "incompatible import type for {module}::{name}: expected {expected}, found {actual}"
            )),
            Error::DuplicateDefinition { module, name } => {
                f.write_fmt(format_args!("{module}::{name} defined twice"))
            }
            Error::UnknownTable(index) => {
                f.write_fmt(format_args!("unknown table {}", index.as_u32()))
            }
            Error::UnknownInstance => f.write_str("instance does not belong to this store"),
        }
    }
}

impl core::error::Error for Error {}

#[macro_export]
macro_rules! wasm_unsupported {
    ($($arg:tt)*) => { $crate::Error::Unsupported(alloc::format!($($arg)*)) }
}

/// A range `offset..offset + len` that does not fit into the table (or donor slice) it was
/// checked against.
///
/// `boundary` is the last valid index of that table or slice, or `0` if it is empty. It is
/// only meant for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutOfBounds {
    pub offset: u32,
    pub len: u32,
    pub boundary: u32,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "out of bounds table access: accessing {} elements at offset {}, last valid index is {}",
            self.len, self.offset, self.boundary
        ))
    }
}

impl core::error::Error for OutOfBounds {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn out_of_bounds_maps_to_trap() {
        let err = Error::from(OutOfBounds {
            offset: 5,
            len: 1,
            boundary: 4,
        });
        assert_eq!(err.as_trap(), Some(Trap::TableOutOfBounds));
        assert_eq!(
            err.to_string(),
            "out of bounds table access: accessing 1 elements at offset 5, last valid index is 4"
        );
    }

    #[test]
    fn linking_errors_are_not_traps() {
        let err = Error::UnknownImport {
            module: "env".into(),
            name: "table".into(),
        };
        assert_eq!(err.as_trap(), None);
        assert_eq!(err.to_string(), "unknown import env::table");
    }
}

use crate::wasm_unsupported;
use core::fmt;
use wasmparser::RefType;

/// The size limits of a table, in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    /// The initial number of elements.
    pub minimum: u32,
    /// The number of elements the table may never grow past, if any.
    pub maximum: Option<u32>,
}

impl Limits {
    /// Returns whether a table with limits `self` can be provided where `required` is declared.
    ///
    /// The provided table must be at least as large as required, and if a maximum is
    /// required it must have a maximum that is no larger.
    pub fn matches(&self, required: &Limits) -> bool {
        if self.minimum < required.minimum {
            return false;
        }
        match (self.maximum, required.maximum) {
            (None, Some(_)) => false,
            (Some(actual), Some(required)) => actual <= required,
            (_, None) => true,
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min={}", self.minimum)?;
        if let Some(maximum) = self.maximum {
            write!(f, " max={maximum}")?;
        }
        Ok(())
    }
}

/// The type of a table: what it holds and how large it may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    pub element_type: RefType,
    pub limits: Limits,
}

impl TableType {
    pub fn new(element_type: RefType, limits: Limits) -> Self {
        Self {
            element_type,
            limits,
        }
    }

    /// Returns whether a table of type `self` can be provided for an import of type `required`.
    pub fn matches(&self, required: &TableType) -> bool {
        self.element_type == required.element_type && self.limits.matches(&required.limits)
    }
}

impl TryFrom<wasmparser::TableType> for TableType {
    type Error = crate::Error;

    fn try_from(ty: wasmparser::TableType) -> crate::Result<Self> {
        if ty.table64 {
            return Err(wasm_unsupported!("64-bit tables"));
        }
        if ty.shared {
            return Err(wasm_unsupported!("shared tables"));
        }

        let minimum = u32::try_from(ty.initial)
            .map_err(|_| wasm_unsupported!("table minimum {} exceeds 32 bits", ty.initial))?;
        let maximum = ty
            .maximum
            .map(|max| {
                u32::try_from(max)
                    .map_err(|_| wasm_unsupported!("table maximum {max} exceeds 32 bits"))
            })
            .transpose()?;

        Ok(Self::new(ty.element_type, Limits { minimum, maximum }))
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element_type, self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn limits(minimum: u32, maximum: Option<u32>) -> Limits {
        Limits { minimum, maximum }
    }

    #[test]
    fn limits_matching() {
        // provided minimum must cover the required one
        assert!(limits(2, None).matches(&limits(1, None)));
        assert!(!limits(1, None).matches(&limits(2, None)));

        // a required maximum needs a provided maximum that is no larger
        assert!(!limits(1, None).matches(&limits(1, Some(5))));
        assert!(limits(1, Some(5)).matches(&limits(1, Some(5))));
        assert!(limits(1, Some(4)).matches(&limits(1, Some(5))));
        assert!(!limits(1, Some(6)).matches(&limits(1, Some(5))));

        // no required maximum accepts anything
        assert!(limits(1, Some(6)).matches(&limits(0, None)));
    }

    #[test]
    fn table_type_matching_checks_element_type() {
        let funcs = TableType::new(RefType::FUNCREF, limits(1, None));
        let externs = TableType::new(RefType::EXTERNREF, limits(1, None));
        assert!(funcs.matches(&funcs));
        assert!(!funcs.matches(&externs));
    }

    #[test]
    fn display() {
        assert_eq!(limits(1, Some(5)).to_string(), "min=1 max=5");
        assert_eq!(limits(3, None).to_string(), "min=3");
    }

    #[test]
    fn from_wasmparser() {
        let ty = TableType::try_from(wasmparser::TableType {
            element_type: RefType::FUNCREF,
            table64: false,
            initial: 2,
            maximum: Some(5),
            shared: false,
        })
        .unwrap();
        assert_eq!(ty.limits, limits(2, Some(5)));

        let err = TableType::try_from(wasmparser::TableType {
            element_type: RefType::FUNCREF,
            table64: true,
            initial: 0,
            maximum: None,
            shared: false,
        })
        .unwrap_err();
        assert!(matches!(err, crate::Error::Unsupported(_)));

        let err = TableType::try_from(wasmparser::TableType {
            element_type: RefType::FUNCREF,
            table64: false,
            initial: u64::from(u32::MAX) + 1,
            maximum: None,
            shared: false,
        })
        .unwrap_err();
        assert!(matches!(err, crate::Error::Unsupported(_)));
    }
}

use crate::enum_accessors;
use crate::indices::{ExternIndex, FuncIndex};
use core::fmt;

/// A reference value stored in a table slot.
///
/// References are inert: a table only ever stores, copies and compares them, it never looks at
/// what they point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ref {
    /// The null reference. Every slot a table allocates starts out holding this value.
    #[default]
    Null,
    /// A function reference.
    Func(FuncIndex),
    /// An external reference to a host object.
    Extern(ExternIndex),
}

impl Ref {
    /// Is this the null reference?
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    enum_accessors! {
        e
        (Func(FuncIndex) is_func func unwrap_func *e)
        (Extern(ExternIndex) is_extern extern_ unwrap_extern *e)
    }
}

impl From<FuncIndex> for Ref {
    #[inline]
    fn from(index: FuncIndex) -> Self {
        Self::Func(index)
    }
}

impl From<ExternIndex> for Ref {
    #[inline]
    fn from(index: ExternIndex) -> Self {
        Self::Extern(index)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Null => f.write_str("ref.null"),
            Ref::Func(index) => write!(f, "ref.func {}", index.as_u32()),
            Ref::Extern(index) => write!(f, "ref.extern {}", index.as_u32()),
        }
    }
}

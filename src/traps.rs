use crate::errors::OutOfBounds;

/// A guest-visible trap raised by a table operation.
#[derive(onlyerror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// Out-of-bounds access to a table.
    #[error("out of bounds table access")]
    TableOutOfBounds,
    /// Indirect call to a null table entry.
    #[error("uninitialized element")]
    IndirectCallToNull,
    /// Indirect call through a table entry that does not reference a function.
    #[error("indirect call type mismatch")]
    BadSignature,
}

impl From<OutOfBounds> for Trap {
    fn from(_: OutOfBounds) -> Self {
        Trap::TableOutOfBounds
    }
}

#[macro_export]
macro_rules! enum_accessors {
    ($bind:ident $(($variant:ident($ty:ty) $is:ident $get:ident $unwrap:ident $cvt:expr))*) => ($(
        /// Returns `true` if this value holds the corresponding variant.
        #[inline]
        pub fn $is(&self) -> bool {
            matches!(self, Self::$variant(_))
        }

        /// Attempt to access the underlying value, returning `None` if it is not the correct
        /// variant.
        #[inline]
        pub fn $get(&self) -> Option<$ty> {
            if let Self::$variant($bind) = self {
                Some($cvt)
            } else {
                None
            }
        }

        /// Returns the underlying value, panicking if it's the wrong variant.
        ///
        /// # Panics
        ///
        /// Panics if `self` is not of the right variant.
        #[inline]
        pub fn $unwrap(&self) -> $ty {
            self.$get().expect(concat!("expected ", stringify!($ty)))
        }
    )*)
}

/// Widens a `u32` element count or index into a `usize` for slicing.
#[inline]
pub(crate) fn usize_from(n: u32) -> usize {
    // u32 always fits into usize on the 32- and 64-bit targets we support
    n as usize
}

/// Narrows a slice length to `u32`, saturating at `u32::MAX`.
#[inline]
pub(crate) fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

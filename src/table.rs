//! Table instances.
//!
//! A [`Table`] is to WebAssembly tables what a linear memory is to WebAssembly memories: the
//! runtime object backing `call_indirect`, `table.get`, `table.set`, `table.grow` and the bulk
//! table instructions. Every access is bounds-checked against the current size with 64-bit
//! arithmetic, so no combination of 32-bit guest-supplied operands can wrap around.

use crate::errors::OutOfBounds;
use crate::types::{Limits, TableType};
use crate::utils::{saturating_u32, usize_from};
use crate::values::Ref;
use crate::WASM32_MAX_TABLE_SIZE;
use alloc::vec;
use alloc::vec::Vec;
use wasmparser::RefType;

#[derive(Debug)]
pub struct Table {
    element_type: RefType,
    /// The optional maximum number of elements this table may grow to.
    maximum: Option<u32>,
    elements: Vec<Ref>,
}

impl Table {
    /// Creates a new table holding `ty.limits.minimum` null references.
    ///
    /// The limits are taken as-is, callers are expected to only pass validated table types
    /// (where the minimum is no larger than the maximum).
    pub fn new(ty: &TableType) -> Self {
        Self {
            element_type: ty.element_type,
            maximum: ty.limits.maximum,
            elements: vec![Ref::Null; usize_from(ty.limits.minimum)],
        }
    }

    pub fn element_type(&self) -> RefType {
        self.element_type
    }

    /// Returns the current number of elements.
    ///
    /// Tables never shrink, so this is also the smallest size the table could have been declared
    /// with.
    pub fn size(&self) -> u32 {
        // grow never lets the length pass u32::MAX
        saturating_u32(self.elements.len())
    }

    pub fn has_maximum(&self) -> bool {
        self.maximum.is_some()
    }

    /// Returns the maximum number of elements, or [`WASM32_MAX_TABLE_SIZE`] if the table was
    /// declared without one.
    pub fn maximum(&self) -> u32 {
        self.maximum.unwrap_or(WASM32_MAX_TABLE_SIZE)
    }

    /// Returns the current type of this table, its minimum being the current size.
    pub fn ty(&self) -> TableType {
        TableType::new(
            self.element_type,
            Limits {
                minimum: self.size(),
                maximum: self.maximum,
            },
        )
    }

    /// Returns `true` if the range `offset..offset + len` lies within the table.
    #[inline]
    pub fn in_bounds(&self, offset: u32, len: u32) -> bool {
        u64::from(offset) + u64::from(len) <= u64::from(self.size())
    }

    /// The last valid index of the table, or `0` if the table is empty.
    ///
    /// Only used for reporting errors, never to decide whether an access is allowed.
    #[inline]
    pub fn boundary_index(&self) -> u32 {
        self.size().max(1) - 1
    }

    /// Grows the table by `count` elements, all initialized to `init`.
    ///
    /// Returns `false` and leaves the table untouched if the new size would exceed the maximum
    /// or the new elements could not be allocated.
    pub fn grow(&mut self, count: u32, init: Ref) -> bool {
        let cap = self.maximum();
        // cap - size instead of size + count so the check itself can't overflow
        if count > cap.saturating_sub(self.size()) {
            tracing::trace!(
                size = self.size(),
                count,
                maximum = cap,
                "refusing to grow table past its maximum"
            );
            return false;
        }
        if let Err(err) = self.elements.try_reserve(usize_from(count)) {
            tracing::debug!(count, "failed to allocate table elements: {err}");
            return false;
        }

        let new_len = self.elements.len() + usize_from(count);
        self.elements.resize(new_len, init);
        true
    }

    /// Grows the table by `count` null elements.
    ///
    /// See [`Table::grow`].
    pub fn grow_with_null(&mut self, count: u32) -> bool {
        self.grow(count, Ref::Null)
    }

    /// Returns the elements `offset..offset + len`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit into the table.
    pub fn read_slice(&self, offset: u32, len: u32) -> Result<&[Ref], OutOfBounds> {
        let range = self.checked_range(offset, len)?;
        Ok(&self.elements[range])
    }

    /// Copies `donor[start..start + len]` into the table at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the destination range does not fit into the table. Otherwise,
    /// if the source range does not fit into `donor`, returns [`OutOfBounds`] whose boundary is
    /// the last valid index of `donor`.
    pub fn write_slice(
        &mut self,
        donor: &[Ref],
        offset: u32,
        start: u32,
        len: u32,
    ) -> Result<(), OutOfBounds> {
        let dst = self.checked_range(offset, len)?;

        if u64::from(start) + u64::from(len) > donor.len() as u64 {
            return Err(out_of_bounds(
                start,
                len,
                saturating_u32(donor.len()).max(1) - 1,
            ));
        }
        let src = usize_from(start)..usize_from(start) + usize_from(len);

        self.elements[dst].copy_from_slice(&donor[src]);
        Ok(())
    }

    /// Sets every element in `offset..offset + len` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit into the table.
    pub fn fill_slice(&mut self, value: Ref, offset: u32, len: u32) -> Result<(), OutOfBounds> {
        let range = self.checked_range(offset, len)?;
        self.elements[range].fill(value);
        Ok(())
    }

    /// Copies `len` elements from `src` to `dst` within this table. The ranges may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if either range does not fit into the table, the source range
    /// is checked first.
    pub fn copy_within(&mut self, dst: u32, src: u32, len: u32) -> Result<(), OutOfBounds> {
        let src = self.checked_range(src, len)?;
        let dst = self.checked_range(dst, len)?;
        self.elements.copy_within(src, dst.start);
        Ok(())
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if `index` is not smaller than the size of the table.
    #[inline]
    pub fn get(&self, index: u32) -> Result<Ref, OutOfBounds> {
        self.elements
            .get(usize_from(index))
            .copied()
            .ok_or_else(|| out_of_bounds(index, 1, self.boundary_index()))
    }

    /// Sets the element at `index` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if `index` is not smaller than the size of the table.
    #[inline]
    pub fn set(&mut self, index: u32, value: Ref) -> Result<(), OutOfBounds> {
        let boundary = self.boundary_index();
        let slot = self
            .elements
            .get_mut(usize_from(index))
            .ok_or_else(|| out_of_bounds(index, 1, boundary))?;
        *slot = value;
        Ok(())
    }

    pub fn elements(&self) -> &[Ref] {
        &self.elements
    }

    fn checked_range(&self, offset: u32, len: u32) -> Result<core::ops::Range<usize>, OutOfBounds> {
        if !self.in_bounds(offset, len) {
            return Err(out_of_bounds(offset, len, self.boundary_index()));
        }
        let start = usize_from(offset);
        Ok(start..start + usize_from(len))
    }
}

fn out_of_bounds(offset: u32, len: u32, boundary: u32) -> OutOfBounds {
    tracing::debug!(offset, len, boundary, "table access out of bounds");
    OutOfBounds {
        offset,
        len,
        boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::{ExternIndex, FuncIndex};

    fn table(minimum: u32, maximum: Option<u32>) -> Table {
        Table::new(&TableType::new(
            RefType::FUNCREF,
            Limits { minimum, maximum },
        ))
    }

    fn func(index: u32) -> Ref {
        Ref::Func(FuncIndex::from_u32(index))
    }

    #[test_log::test]
    fn new_table_is_null_filled() {
        let t = table(4, None);
        assert_eq!(t.size(), 4);
        assert_eq!(t.element_type(), RefType::FUNCREF);
        for i in 0..4 {
            assert_eq!(t.get(i), Ok(Ref::Null));
        }
        assert!(!t.has_maximum());
        assert_eq!(t.maximum(), u32::MAX);
    }

    #[test_log::test]
    fn grow_respects_maximum() {
        let mut t = table(2, Some(5));
        assert_eq!(t.size(), 2);

        assert!(t.grow_with_null(3));
        assert_eq!(t.size(), 5);

        assert!(!t.grow_with_null(1));
        assert_eq!(t.size(), 5);

        t.set(4, func(1)).unwrap();
        assert_eq!(t.get(4), Ok(func(1)));
        assert_eq!(
            t.get(5),
            Err(OutOfBounds {
                offset: 5,
                len: 1,
                boundary: 4
            })
        );
    }

    #[test_log::test]
    fn grow_fills_new_slots_with_init() {
        let mut t = table(1, None);
        assert!(t.grow(2, func(9)));
        assert_eq!(t.read_slice(0, 3).unwrap(), &[Ref::Null, func(9), func(9)]);
    }

    #[test_log::test]
    fn grow_by_zero_always_succeeds() {
        let mut t = table(3, Some(3));
        assert!(t.grow_with_null(0));
        assert_eq!(t.size(), 3);
    }

    #[test_log::test]
    fn grow_does_not_wrap() {
        let mut t = table(2, None);
        // 2 + u32::MAX overflows 32 bits and must not wrap around to 1
        assert!(!t.grow_with_null(u32::MAX));
        assert!(!t.grow_with_null(u32::MAX - 1));
        assert_eq!(t.size(), 2);

        let mut t = table(2, Some(3));
        assert!(!t.grow_with_null(u32::MAX));
        assert!(t.grow_with_null(1));
        assert_eq!(t.size(), 3);
    }

    #[test_log::test]
    fn fill_slice() {
        let mut t = table(3, None);
        let extern_ref = Ref::Extern(ExternIndex::from_u32(1));
        t.fill_slice(extern_ref, 1, 2).unwrap();
        assert_eq!(t.get(0), Ok(Ref::Null));
        assert_eq!(t.get(1), Ok(extern_ref));
        assert_eq!(t.get(2), Ok(extern_ref));

        assert_eq!(
            t.fill_slice(extern_ref, 2, 2),
            Err(OutOfBounds {
                offset: 2,
                len: 2,
                boundary: 2
            })
        );
        // a failed fill doesn't touch anything
        assert_eq!(t.get(0), Ok(Ref::Null));
    }

    #[test_log::test]
    fn bounds_are_exact() {
        let t = table(3, None);
        assert!(t.get(2).is_ok());
        assert!(t.get(3).is_err());
        assert!(t.read_slice(3, 1).is_err());
        // empty ranges are fine right up to the end
        assert!(t.read_slice(3, 0).unwrap().is_empty());
        assert!(t.read_slice(4, 0).is_err());
    }

    #[test_log::test]
    fn bounds_check_does_not_overflow() {
        let mut t = table(3, None);
        assert!(!t.in_bounds(u32::MAX, 1));
        assert!(!t.in_bounds(1, u32::MAX));
        assert_eq!(
            t.fill_slice(Ref::Null, u32::MAX, u32::MAX),
            Err(OutOfBounds {
                offset: u32::MAX,
                len: u32::MAX,
                boundary: 2
            })
        );
    }

    #[test_log::test]
    fn empty_table_reports_boundary_zero() {
        let t = table(0, None);
        assert_eq!(t.boundary_index(), 0);
        assert_eq!(
            t.get(0),
            Err(OutOfBounds {
                offset: 0,
                len: 1,
                boundary: 0
            })
        );
    }

    #[test_log::test]
    fn write_then_read() {
        let mut t = table(6, None);
        let donor = [func(0), func(1), func(2), func(3)];
        t.write_slice(&donor, 2, 1, 3).unwrap();
        assert_eq!(t.read_slice(2, 3).unwrap(), &donor[1..4]);
        assert_eq!(t.get(1), Ok(Ref::Null));
        assert_eq!(t.get(5), Ok(Ref::Null));
    }

    #[test_log::test]
    fn write_checks_destination_first() {
        let mut t = table(2, None);
        let donor = [func(0)];
        // both ranges are invalid, the destination is reported
        assert_eq!(
            t.write_slice(&donor, 1, 5, 2),
            Err(OutOfBounds {
                offset: 1,
                len: 2,
                boundary: 1
            })
        );
    }

    #[test_log::test]
    fn write_reports_donor_boundary() {
        let mut t = table(10, None);
        let donor = [func(0), func(1), func(2)];
        assert_eq!(
            t.write_slice(&donor, 0, 2, 2),
            Err(OutOfBounds {
                offset: 2,
                len: 2,
                boundary: 2
            })
        );
        assert_eq!(
            t.write_slice(&[], 0, 0, 1),
            Err(OutOfBounds {
                offset: 0,
                len: 1,
                boundary: 0
            })
        );
        assert_eq!(
            t.write_slice(&donor, 0, u32::MAX, 2),
            Err(OutOfBounds {
                offset: u32::MAX,
                len: 2,
                boundary: 2
            })
        );
        assert!(t.elements().iter().all(Ref::is_null));
    }

    #[test_log::test]
    fn copy_within_handles_overlap() {
        let mut t = table(5, None);
        t.write_slice(&[func(0), func(1), func(2)], 0, 0, 3).unwrap();

        t.copy_within(1, 0, 3).unwrap();
        assert_eq!(
            t.elements(),
            &[func(0), func(0), func(1), func(2), Ref::Null]
        );

        t.copy_within(0, 2, 3).unwrap();
        assert_eq!(
            t.elements(),
            &[func(1), func(2), Ref::Null, func(2), Ref::Null]
        );

        assert_eq!(
            t.copy_within(0, 4, 2),
            Err(OutOfBounds {
                offset: 4,
                len: 2,
                boundary: 4
            })
        );
    }

    #[test_log::test]
    fn ty_reflects_growth() {
        let mut t = table(1, Some(4));
        assert!(t.grow_with_null(2));
        assert_eq!(
            t.ty().limits,
            Limits {
                minimum: 3,
                maximum: Some(4)
            }
        );
    }
}

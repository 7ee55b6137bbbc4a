//! Entry points for the table instructions.
//!
//! These are what an interpreter (or compiled code calling back into the runtime) invokes to
//! execute `table.size`, `table.get`, `table.set`, `table.grow`, `table.fill`, `table.copy`,
//! `table.init`, `elem.drop` and the table lookup of `call_indirect`. Table and segment
//! indices are relative to the given instance. Out-of-bounds accesses surface as
//! [`Error::TableOutOfBounds`], which [`Error::as_trap`] turns into [`Trap::TableOutOfBounds`].

use crate::indices::{ElemIndex, FuncIndex, TableIndex};
use crate::instance::Instance;
use crate::store::Store;
use crate::table::Table;
use crate::traps::Trap;
use crate::values::Ref;
use crate::{Error, GROW_FAILED};
use alloc::vec::Vec;

fn table(store: &Store, instance: Instance, index: TableIndex) -> crate::Result<&Table> {
    let addr = instance.table_addr(store, index)?;
    store.table(addr).ok_or(Error::UnknownTable(index))
}

fn table_mut(
    store: &mut Store,
    instance: Instance,
    index: TableIndex,
) -> crate::Result<&mut Table> {
    let addr = instance.table_addr(store, index)?;
    store.table_mut(addr).ok_or(Error::UnknownTable(index))
}

/// `table.size`
///
/// # Errors
///
/// Returns an error if `table` is not a table of `instance`.
pub fn table_size(store: &Store, instance: Instance, table: TableIndex) -> crate::Result<u32> {
    Ok(self::table(store, instance, table)?.size())
}

/// `table.get`
///
/// # Errors
///
/// Returns [`Error::TableOutOfBounds`] if `index` is outside the table.
pub fn table_get(
    store: &Store,
    instance: Instance,
    table: TableIndex,
    index: u32,
) -> crate::Result<Ref> {
    Ok(self::table(store, instance, table)?.get(index)?)
}

/// `table.set`
///
/// # Errors
///
/// Returns [`Error::TableOutOfBounds`] if `index` is outside the table.
pub fn table_set(
    store: &mut Store,
    instance: Instance,
    table: TableIndex,
    index: u32,
    value: Ref,
) -> crate::Result<()> {
    table_mut(store, instance, table)?.set(index, value)?;
    Ok(())
}

/// `table.grow`
///
/// Returns the size of the table before growing it, or [`GROW_FAILED`] if it can't grow by
/// `delta` elements. Failing to grow is not an error.
///
/// # Errors
///
/// Returns an error if `table` is not a table of `instance`.
pub fn table_grow(
    store: &mut Store,
    instance: Instance,
    table: TableIndex,
    delta: u32,
    init: Ref,
) -> crate::Result<u32> {
    let table = table_mut(store, instance, table)?;
    let old_size = table.size();
    if table.grow(delta, init) {
        Ok(old_size)
    } else {
        Ok(GROW_FAILED)
    }
}

/// `table.fill`
///
/// # Errors
///
/// Returns [`Error::TableOutOfBounds`] if `dst..dst + len` is outside the table.
pub fn table_fill(
    store: &mut Store,
    instance: Instance,
    table: TableIndex,
    dst: u32,
    value: Ref,
    len: u32,
) -> crate::Result<()> {
    table_mut(store, instance, table)?.fill_slice(value, dst, len)?;
    Ok(())
}

/// `table.copy`
///
/// The source range is checked before the destination range.
///
/// # Errors
///
/// Returns [`Error::TableOutOfBounds`] if either range is outside its table.
pub fn table_copy(
    store: &mut Store,
    instance: Instance,
    dst_table: TableIndex,
    src_table: TableIndex,
    dst: u32,
    src: u32,
    len: u32,
) -> crate::Result<()> {
    if dst_table == src_table {
        table_mut(store, instance, dst_table)?.copy_within(dst, src, len)?;
        return Ok(());
    }

    // Both tables live in the same store, so the source elements are copied out first.
    let items: Vec<Ref> = table(store, instance, src_table)?
        .read_slice(src, len)?
        .to_vec();
    table_mut(store, instance, dst_table)?.write_slice(&items, dst, 0, len)?;
    Ok(())
}

/// `table.init`
///
/// Copies `src..src + len` of the passive element segment `elem` into the table at `dst`.
/// Dropped segments are treated as empty, so any `len > 0` fails on them.
///
/// # Errors
///
/// Returns [`Error::TableOutOfBounds`] if the destination range is outside the table or the
/// source range is outside the segment.
pub fn table_init(
    store: &mut Store,
    instance: Instance,
    table: TableIndex,
    elem: ElemIndex,
    dst: u32,
    src: u32,
    len: u32,
) -> crate::Result<()> {
    let (items, table) = instance.elements_and_table(store, elem, table)?;
    table.write_slice(items, dst, src, len)?;
    Ok(())
}

/// `elem.drop`
///
/// # Errors
///
/// Returns an error if `instance` does not belong to `store`.
pub fn elem_drop(store: &mut Store, instance: Instance, elem: ElemIndex) -> crate::Result<()> {
    tracing::trace!("dropping element segment {}", elem.as_u32());
    instance.drop_elements(store, elem)
}

/// Looks up the callee of a `call_indirect` through `table`.
///
/// # Errors
///
/// Traps with [`Trap::TableOutOfBounds`] if `index` is outside the table,
/// [`Trap::IndirectCallToNull`] if the slot is null, and [`Trap::BadSignature`] if it doesn't
/// hold a function reference.
pub fn indirect_call_target(
    store: &Store,
    instance: Instance,
    table: TableIndex,
    index: u32,
) -> crate::Result<FuncIndex> {
    match self::table(store, instance, table)?.get(index)? {
        Ref::Func(func) => Ok(func),
        Ref::Null => Err(Trap::IndirectCallToNull.into()),
        Ref::Extern(_) => Err(Trap::BadSignature.into()),
    }
}

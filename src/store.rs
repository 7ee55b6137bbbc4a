use crate::indices::{InstanceIndex, TableAddr};
use crate::instance::InstanceData;
use crate::table::Table;
use crate::types::TableType;
use cranelift_entity::PrimaryMap;

/// Owner of all table instances and the instances that use them.
///
/// Tables are only ever handed out by reference, the store keeps ownership for its whole
/// lifetime.
#[derive(Debug, Default)]
pub struct Store {
    tables: PrimaryMap<TableAddr, Table>,
    instances: PrimaryMap<InstanceIndex, InstanceData>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table of type `ty` and returns its address.
    pub fn push_table(&mut self, ty: &TableType) -> TableAddr {
        let addr = self.tables.push(Table::new(ty));
        tracing::trace!("allocated table {} of type {ty}", addr.as_u32());
        addr
    }

    /// Returns the table at `addr`, if there is one.
    pub fn table(&self, addr: TableAddr) -> Option<&Table> {
        self.tables.get(addr)
    }

    /// Returns the table at `addr`, if there is one.
    pub fn table_mut(&mut self, addr: TableAddr) -> Option<&mut Table> {
        self.tables.get_mut(addr)
    }

    pub(crate) fn push_instance(&mut self, data: InstanceData) -> InstanceIndex {
        self.instances.push(data)
    }

    pub(crate) fn instance_data(&self, index: InstanceIndex) -> Option<&InstanceData> {
        self.instances.get(index)
    }

    /// Borrows an instance's data and a table at the same time.
    pub(crate) fn instance_data_and_table_mut(
        &mut self,
        instance: InstanceIndex,
        addr: TableAddr,
    ) -> Option<(&InstanceData, &mut Table)> {
        let data = self.instances.get(instance)?;
        let table = self.tables.get_mut(addr)?;
        Some((data, table))
    }

    pub(crate) fn instance_data_mut(&mut self, index: InstanceIndex) -> Option<&mut InstanceData> {
        self.instances.get_mut(index)
    }
}

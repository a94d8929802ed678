//! Borrowed views of a single row.

use nexus_common::error::TableResult;
use nexus_common::types::{RowHandle, RowState, RowVersion};

use super::{ColumnKey, Table};
use crate::value::Value;

/// Read-only view of a row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    handle: RowHandle,
}

impl<'a> RowRef<'a> {
    /// The row's handle.
    #[inline]
    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    /// The table the row belongs to.
    #[inline]
    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Derived state.
    pub fn state(&self) -> TableResult<RowState> {
        self.table.row_state(self.handle)
    }

    /// Reads a column in the default version.
    pub fn get(&self, key: impl ColumnKey) -> TableResult<Value> {
        self.table.get(self.handle, key)
    }

    /// Reads a column in `version`.
    pub fn value(&self, key: impl ColumnKey, version: RowVersion) -> TableResult<Value> {
        self.table.value(self.handle, key, version)
    }

    /// Returns true if the column holds null in the default version.
    pub fn is_null(&self, key: impl ColumnKey) -> TableResult<bool> {
        self.table.is_null(self.handle, key, RowVersion::Default)
    }

    /// Returns true if the row has data in `version`.
    pub fn has_version(&self, version: RowVersion) -> TableResult<bool> {
        self.table.has_version(self.handle, version)
    }

    /// Every column in the default version.
    pub fn values(&self) -> TableResult<Vec<Value>> {
        self.table.item_array(self.handle)
    }
}

/// Mutable view of a row.
#[derive(Debug)]
pub struct RowMut<'a> {
    table: &'a mut Table,
    handle: RowHandle,
}

impl<'a> RowMut<'a> {
    /// The row's handle.
    #[inline]
    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    /// Reborrows as a read-only view.
    pub fn view(&self) -> RowRef<'_> {
        RowRef {
            table: self.table,
            handle: self.handle,
        }
    }

    /// Reads a column in the default version.
    pub fn get(&self, key: impl ColumnKey) -> TableResult<Value> {
        self.table.get(self.handle, key)
    }

    /// Writes a column.
    pub fn set(&mut self, key: impl ColumnKey, value: impl Into<Value>) -> TableResult<&mut Self> {
        self.table.set_value(self.handle, key, value)?;
        Ok(self)
    }

    /// Writes every column.
    pub fn set_values(&mut self, values: &[Value]) -> TableResult<()> {
        self.table.set_item_array(self.handle, values)
    }

    /// Opens an edit.
    pub fn begin_edit(&mut self) -> TableResult<()> {
        self.table.begin_edit(self.handle)
    }

    /// Commits the open edit.
    pub fn end_edit(&mut self) -> TableResult<()> {
        self.table.end_edit(self.handle)
    }

    /// Drops the open edit.
    pub fn cancel_edit(&mut self) -> TableResult<()> {
        self.table.cancel_edit(self.handle)
    }

    /// Deletes the row.
    pub fn delete(self) -> TableResult<()> {
        self.table.delete(self.handle)
    }

    /// Accepts the row's changes.
    pub fn accept_changes(&mut self) -> TableResult<()> {
        self.table.accept_changes(self.handle)
    }

    /// Rejects the row's changes.
    pub fn reject_changes(&mut self) -> TableResult<()> {
        self.table.reject_changes(self.handle)
    }
}

impl Table {
    /// Borrows a read-only view of a row.
    pub fn row_ref(&self, handle: RowHandle) -> TableResult<RowRef<'_>> {
        self.rows.get(handle)?;
        Ok(RowRef {
            table: self,
            handle,
        })
    }

    /// Borrows a mutable view of a row.
    pub fn row_mut(&mut self, handle: RowHandle) -> TableResult<RowMut<'_>> {
        self.rows.get(handle)?;
        Ok(RowMut {
            table: self,
            handle,
        })
    }
}

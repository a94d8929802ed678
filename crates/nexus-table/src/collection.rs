//! Row collection.
//!
//! Holds every row a table has created, keyed by [`RowHandle`], plus the
//! ordered sequence of attached rows. Attaching appends a row and gives it
//! the next row id; detaching removes it and renumbers the rows after it so
//! row ids stay dense.

use std::collections::HashMap;

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowId};

use crate::row::Row;

/// Rows of one table.
#[derive(Debug, Clone)]
pub struct RowCollection {
    rows: HashMap<RowHandle, Row>,
    order: Vec<RowHandle>,
    next_handle: RowHandle,
}

impl Default for RowCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
            next_handle: RowHandle::new(1),
        }
    }

    /// Creates a detached row and returns its handle.
    pub fn create(&mut self) -> RowHandle {
        let handle = self.next_handle;
        self.next_handle = handle.next();
        self.rows.insert(handle, Row::new(handle));
        handle
    }

    /// Returns the row for `handle`.
    pub fn get(&self, handle: RowHandle) -> TableResult<&Row> {
        self.rows.get(&handle).ok_or(TableError::UnknownRow { handle })
    }

    pub(crate) fn get_mut(&mut self, handle: RowHandle) -> TableResult<&mut Row> {
        self.rows
            .get_mut(&handle)
            .ok_or(TableError::UnknownRow { handle })
    }

    /// Returns true if `handle` belongs to this collection, attached or not.
    pub fn contains(&self, handle: RowHandle) -> bool {
        self.rows.contains_key(&handle)
    }

    /// Appends the row to the attached sequence.
    pub(crate) fn attach(&mut self, handle: RowHandle) -> TableResult<RowId> {
        let position = self.order.len();
        let row = self.get_mut(handle)?;
        if row.is_attached() {
            return Err(TableError::RowAlreadyAttached { handle });
        }
        let row_id = RowId::new(position);
        row.set_row_id(Some(row_id));
        self.order.push(handle);
        Ok(row_id)
    }

    /// Removes the row from the attached sequence, keeping its record.
    ///
    /// Detaching a row that is not attached is a no-op.
    pub(crate) fn detach(&mut self, handle: RowHandle) -> TableResult<()> {
        let Some(row_id) = self.get(handle)?.row_id() else {
            return Ok(());
        };

        let index = row_id.as_usize();
        self.order.remove(index);
        for (position, later) in self.order.iter().enumerate().skip(index) {
            if let Some(row) = self.rows.get_mut(later) {
                row.set_row_id(Some(RowId::new(position)));
            }
        }
        self.get_mut(handle)?.set_row_id(None);
        Ok(())
    }

    /// Drops the record of a detached row.
    pub(crate) fn release(&mut self, handle: RowHandle) -> TableResult<Row> {
        if self.get(handle)?.is_attached() {
            return Err(TableError::RowAlreadyAttached { handle });
        }
        self.rows
            .remove(&handle)
            .ok_or(TableError::UnknownRow { handle })
    }

    /// Number of attached rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no row is attached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of row records, detached ones included.
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Handle of the attached row at `index`.
    pub fn handle_at(&self, index: usize) -> Option<RowHandle> {
        self.order.get(index).copied()
    }

    /// Position of an attached row.
    pub fn index_of(&self, handle: RowHandle) -> Option<usize> {
        self.rows
            .get(&handle)
            .and_then(Row::row_id)
            .map(RowId::as_usize)
    }

    /// Handles of the attached rows, in row id order.
    pub fn handles(&self) -> &[RowHandle] {
        &self.order
    }

    /// Iterates the attached rows in row id order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.order.iter().filter_map(|handle| self.rows.get(handle))
    }

    /// Iterates every row record, detached ones included.
    pub fn all_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }
}

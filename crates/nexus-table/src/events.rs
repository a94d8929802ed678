//! Table notifications.
//!
//! Collaborators such as constraint checkers and relation cascades observe a
//! table through the [`TableListener`] trait. Listeners are invoked
//! synchronously, in registration order, from inside the operation that
//! raised the notification. The `*_changing`, `row_deleting` and
//! `child_check` methods may veto the operation by returning an error; the
//! first error stops the walk and is returned to the caller unchanged.
//!
//! Every method receives `&mut Table`, so a listener can read the row that
//! triggered it (pending proposed version included) and edit other rows or,
//! through its own handles, other tables.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use nexus_common::error::TableResult;
use nexus_common::types::{ListenerId, RowHandle};

use crate::table::Table;
use crate::value::Value;

/// Kind of row transition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Row attached to the collection.
    Add,
    /// Pending edit committed.
    Change,
    /// Row deleted.
    Delete,
    /// Changes accepted.
    Commit,
    /// Changes rejected.
    Rollback,
    /// Current and original versions replaced together.
    ChangeCurrentAndOriginal,
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single value write.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChange {
    /// The row written to.
    pub row: RowHandle,
    /// Column ordinal.
    pub ordinal: usize,
    /// Column name.
    pub column: String,
    /// Value before the write.
    pub previous: Value,
    /// Value being written, already coerced to the column type.
    pub proposed: Value,
}

/// Observer of a table's row transitions.
///
/// All methods have no-op defaults.
#[allow(unused_variables)]
pub trait TableListener {
    /// A value is about to be written. An error rejects the write.
    fn column_changing(&mut self, table: &mut Table, change: &ColumnChange) -> TableResult<()> {
        Ok(())
    }

    /// A value was written.
    fn column_changed(&mut self, table: &mut Table, change: &ColumnChange) {}

    /// A row transition is about to happen. An error rejects it.
    fn row_changing(
        &mut self,
        table: &mut Table,
        row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        Ok(())
    }

    /// A row transition happened.
    fn row_changed(&mut self, table: &mut Table, row: RowHandle, action: RowAction) {}

    /// A row is about to be deleted. An error rejects the delete.
    fn row_deleting(&mut self, table: &mut Table, row: RowHandle) -> TableResult<()> {
        Ok(())
    }

    /// A row was deleted.
    fn row_deleted(&mut self, table: &mut Table, row: RowHandle) {}

    /// Relation check before a transition becomes final.
    ///
    /// For [`RowAction::Change`] the row's current version still holds the
    /// old values and its proposed version the new ones. Cascades run here;
    /// an error rejects the transition.
    fn child_check(
        &mut self,
        table: &mut Table,
        row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        Ok(())
    }

    /// A fresh row was created by `new_row`.
    fn table_new_row(&mut self, table: &mut Table, row: RowHandle) {}

    /// Every row is about to be removed.
    fn table_clearing(&mut self, table: &mut Table) {}

    /// Every row was removed.
    fn table_cleared(&mut self, table: &mut Table) {}
}

/// Shared handle to a registered listener.
pub type SharedListener = Rc<RefCell<dyn TableListener>>;

/// Ordered list of registered listeners.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, SharedListener)>,
    next_id: u64,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: SharedListener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId::new(self.next_id);
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clones the current list so listeners may register or remove
    /// listeners while being notified.
    pub(crate) fn snapshot(&self) -> Vec<SharedListener> {
        self.entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

//! Row edit protocol.
//!
//! `begin_edit` opens a proposed version, `end_edit` commits it into the
//! current version and `cancel_edit` drops it. `set_value` is a thin wrapper
//! that opens and commits an edit around a single write when the caller has
//! not opened one. `delete`, `accept_changes` and `reject_changes` move a
//! row between states.
//!
//! Vetoable notifications run before any slot is released, so a rejected
//! operation leaves the row exactly as it was.

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowState, RowVersion, SlotId};
use tracing::trace;

use super::{ColumnKey, Table};
use crate::events::{ColumnChange, RowAction};
use crate::value::Value;

/// An edit installed as the current version whose old current version is
/// still allocated.
#[derive(Debug, Clone, Copy)]
struct PendingCommit {
    proposed: SlotId,
    previous: Option<SlotId>,
    replaced: Option<SlotId>,
    changed: bool,
}

impl Table {
    /// Opens an edit: copies the current version (or the defaults) into a
    /// new proposed version. A no-op if an edit is already open.
    pub fn begin_edit(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        row.edit_flag().check("begin_edit")?;
        if row.state() == RowState::Deleted {
            return Err(TableError::DeletedRowInaccessible);
        }
        if row.is_editing() {
            return Ok(());
        }

        let from = row.current().unwrap_or(self.arena.default_slot());
        let slot = self.allocate_slot()?;
        self.copy_slot(from, slot);
        self.rows.get_mut(handle)?.set_proposed(Some(slot));

        trace!(table = %self.name, row = %handle, slot = %slot, "begin edit");
        Ok(())
    }

    /// Commits the open edit. A no-op if no edit is open.
    ///
    /// Listeners see `row_changing(Change)` and then `child_check(Change)`
    /// with the old values still current. If either rejects, or a
    /// non-nullable column holds null, the proposed version stays pending
    /// and the current version is untouched. A row that is not attached
    /// still commits; its row id stays empty.
    pub fn end_edit(&mut self, handle: RowHandle) -> TableResult<()> {
        let flag = self.rows.get(handle)?.edit_flag().clone();
        flag.check("end_edit")?;
        if let Some(commit) = self.install_proposed(handle, "end_edit")? {
            self.finish_commit(handle, commit);
        }
        Ok(())
    }

    /// Vets the open edit and makes it the current version. The replaced
    /// current version stays allocated until `finish_commit` or
    /// `undo_commit`.
    fn install_proposed(
        &mut self,
        handle: RowHandle,
        operation: &'static str,
    ) -> TableResult<Option<PendingCommit>> {
        let row = self.rows.get(handle)?;
        let flag = row.edit_flag().clone();
        let Some(proposed) = row.proposed() else {
            return Ok(None);
        };

        self.check_nulls(proposed)?;
        {
            let _guard = flag.acquire(operation)?;
            self.row_changing(handle, RowAction::Change)?;
            self.child_check(handle, RowAction::Change)?;
        }

        let row = self.rows.get_mut(handle)?;
        let changed = row.has_pending_change();
        let original = row.original();
        let previous = row.current();
        let Some(proposed) = row.take_proposed() else {
            return Ok(None);
        };
        row.set_current(Some(proposed));
        Ok(Some(PendingCommit {
            proposed,
            previous,
            replaced: previous.filter(|p| Some(*p) != original),
            changed,
        }))
    }

    fn finish_commit(&mut self, handle: RowHandle, commit: PendingCommit) {
        if let Some(replaced) = commit.replaced {
            self.dispose_slot(replaced);
        }
        trace!(table = %self.name, row = %handle, slot = %commit.proposed, "end edit");
        if commit.changed {
            self.row_changed(handle, RowAction::Change);
        }
    }

    /// Puts an installed edit back into the proposed version.
    fn undo_commit(&mut self, handle: RowHandle, commit: PendingCommit) -> TableResult<()> {
        let row = self.rows.get_mut(handle)?;
        row.set_current(commit.previous);
        row.set_proposed(Some(commit.proposed));
        if commit.changed {
            row.mark_changed();
        }
        Ok(())
    }

    /// Drops the open edit. A no-op if no edit is open.
    pub fn cancel_edit(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get_mut(handle)?;
        row.edit_flag().check("cancel_edit")?;
        let Some(proposed) = row.take_proposed() else {
            return Ok(());
        };
        self.dispose_slot(proposed);

        trace!(table = %self.name, row = %handle, "cancel edit");
        Ok(())
    }

    /// Deletes an attached row.
    ///
    /// An `Added` row is detached entirely. Any other row keeps only its
    /// original version and becomes `Deleted`. Deleting a `Deleted` row is a
    /// no-op. A pending edit is discarded.
    pub fn delete(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        let flag = row.edit_flag().clone();
        flag.check("delete")?;
        if !row.is_attached() {
            return Err(TableError::RowNotInTable);
        }
        if row.state() == RowState::Deleted {
            return Ok(());
        }

        {
            let _guard = flag.acquire("delete")?;
            self.dispatch(|listener, table| listener.row_deleting(table, handle))?;
            self.child_check(handle, RowAction::Delete)?;
        }

        let row = self.rows.get_mut(handle)?;
        if row.state() == RowState::Added {
            self.detach_row(handle)?;
        } else {
            let original = row.original();
            let proposed = row.take_proposed();
            let current = row.current();
            row.set_current(None);
            for slot in [proposed, current].into_iter().flatten() {
                if Some(slot) != original {
                    self.dispose_slot(slot);
                }
            }
        }

        trace!(table = %self.name, row = %handle, "deleted row");
        self.notify(|listener, table| listener.row_deleted(table, handle));
        Ok(())
    }

    /// Commits the row's pending changes.
    ///
    /// Any open edit is ended first. `Added` and `Modified` rows become
    /// `Unchanged`; a `Deleted` row is detached. Accepting an `Unchanged`
    /// row is a no-op. If the commit is rejected, an edit ended here is
    /// reopened and the row keeps every version it had.
    pub fn accept_changes(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        let flag = row.edit_flag().clone();
        flag.check("accept_changes")?;
        if !row.is_attached() {
            return Err(TableError::RowNotInTable);
        }

        let pending = self.install_proposed(handle, "accept_changes")?;
        if pending.is_none() && self.rows.get(handle)?.state() == RowState::Unchanged {
            return Ok(());
        }

        let vetted = {
            let _guard = flag.acquire("accept_changes")?;
            self.row_changing(handle, RowAction::Commit)
                .and_then(|()| self.child_check(handle, RowAction::Commit))
        };
        if let Err(err) = vetted {
            if let Some(commit) = pending {
                self.undo_commit(handle, commit)?;
            }
            return Err(err);
        }
        if let Some(commit) = pending {
            self.finish_commit(handle, commit);
        }

        let row = self.rows.get_mut(handle)?;
        match row.state() {
            RowState::Added | RowState::Modified => {
                let old = row.original();
                let current = row.current();
                row.set_original(current);
                if let Some(old) = old {
                    self.dispose_slot(old);
                }
            }
            RowState::Deleted => self.detach_row(handle)?,
            RowState::Unchanged | RowState::Detached => {}
        }

        trace!(table = %self.name, row = %handle, "accepted changes");
        self.row_changed(handle, RowAction::Commit);
        Ok(())
    }

    /// Rolls the row back to its original version.
    ///
    /// An `Added` row is detached entirely. A pending edit is discarded.
    pub fn reject_changes(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        let flag = row.edit_flag().clone();
        flag.check("reject_changes")?;
        if !row.is_attached() {
            return Err(TableError::RowNotInTable);
        }
        if row.state() == RowState::Unchanged && !row.is_editing() {
            return Ok(());
        }

        {
            let _guard = flag.acquire("reject_changes")?;
            self.row_changing(handle, RowAction::Rollback)?;
            self.child_check(handle, RowAction::Rollback)?;
        }

        let row = self.rows.get_mut(handle)?;
        if row.state() == RowState::Added {
            self.detach_row(handle)?;
        } else {
            let original = row.original();
            let proposed = row.take_proposed();
            let current = row.current();
            row.set_current(original);
            for slot in [proposed, current].into_iter().flatten() {
                if Some(slot) != original {
                    self.dispose_slot(slot);
                }
            }
        }

        trace!(table = %self.name, row = %handle, "rejected changes");
        self.row_changed(handle, RowAction::Rollback);
        Ok(())
    }

    /// Writes a single value.
    ///
    /// If no edit is open, the write opens one and commits it before
    /// returning; should that commit fail, the edit is cancelled and the row
    /// is left as it was. Writing null to an auto-increment column keeps
    /// the generated value.
    pub fn set_value(
        &mut self,
        handle: RowHandle,
        key: impl ColumnKey,
        value: impl Into<Value>,
    ) -> TableResult<()> {
        let value = value.into();
        let ordinal = key.resolve(self)?;
        let row = self.rows.get(handle)?;
        let flag = row.edit_flag().clone();
        flag.check("set_value")?;
        if row.state() == RowState::Deleted {
            return Err(TableError::DeletedRowInaccessible);
        }
        let attached = row.is_attached();
        let already_editing = row.is_editing();

        let column = self.columns.column(ordinal)?;
        if column.is_read_only() && attached {
            return Err(TableError::ReadOnlyViolation {
                column: column.name().to_string(),
            });
        }
        if value.is_null() && column.is_auto_increment() {
            return Ok(());
        }
        let proposed = self.check_value(ordinal, &value)?;

        let previous = match row.slot_for(RowVersion::Default) {
            Ok(slot) => self.storages[ordinal].get(slot),
            Err(_) => self.storages[ordinal].get(self.arena.default_slot()),
        };
        let change = ColumnChange {
            row: handle,
            ordinal,
            column: column.name().to_string(),
            previous,
            proposed,
        };

        {
            let _guard = flag.acquire("set_value")?;
            self.dispatch(|listener, table| listener.column_changing(table, &change))?;
        }

        if !already_editing {
            self.begin_edit(handle)?;
        }
        let slot = self.rows.get(handle)?.slot_for(RowVersion::Proposed)?;
        if let Err(err) = self.store_value(ordinal, slot, &change.proposed) {
            if !already_editing {
                self.cancel_edit(handle)?;
            }
            return Err(err);
        }
        self.rows.get_mut(handle)?.mark_changed();
        self.notify(|listener, table| listener.column_changed(table, &change));

        if !already_editing {
            if let Err(err) = self.end_edit(handle) {
                self.cancel_edit(handle)?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Writes every column of a row inside one edit.
    ///
    /// Fewer values than columns leave the remaining columns untouched.
    pub fn set_item_array(&mut self, handle: RowHandle, values: &[Value]) -> TableResult<()> {
        if values.len() > self.columns.len() {
            return Err(TableError::TooManyValues {
                given: values.len(),
                columns: self.columns.len(),
            });
        }
        let already_editing = self.rows.get(handle)?.is_editing();
        self.begin_edit(handle)?;

        let result = values
            .iter()
            .enumerate()
            .try_for_each(|(ordinal, value)| self.set_value(handle, ordinal, value.clone()))
            .and_then(|()| {
                if already_editing {
                    Ok(())
                } else {
                    self.end_edit(handle)
                }
            });

        if let Err(err) = result {
            if !already_editing {
                self.cancel_edit(handle)?;
            }
            return Err(err);
        }
        Ok(())
    }
}

//! The table: schema, slot arena, column storages and rows.
//!
//! [`Table`] coordinates every component of the row store. It owns the
//! [`ColumnSet`] and one [`ColumnStorage`] per column (kept parallel by
//! ordinal), the [`SlotArena`] those storages are indexed by, and the
//! [`RowCollection`]. Rows are addressed by [`RowHandle`].
//!
//! The edit protocol lives in `edit.rs`, schema evolution in `schema.rs`
//! and row import in `import.rs`.

mod builder;
mod edit;
mod import;
mod schema;
mod view;

pub use builder::{RowInitializer, TableBuilder};
pub use view::{RowMut, RowRef};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use nexus_common::config::TableConfig;
use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{ListenerId, RowHandle, RowState, RowStates, RowVersion, SlotId};
use tracing::{debug, trace};

use crate::arena::SlotArena;
use crate::collection::RowCollection;
use crate::column::{AutoIncrement, Column, ColumnSet};
use crate::events::{Listeners, RowAction, SharedListener, TableListener};
use crate::row::Row;
use crate::storage::ColumnStorage;
use crate::value::Value;

/// Anything that names a column: an ordinal or a column name.
pub trait ColumnKey {
    /// Resolves the key to an ordinal of `table`.
    fn resolve(&self, table: &Table) -> TableResult<usize>;
}

impl ColumnKey for usize {
    fn resolve(&self, table: &Table) -> TableResult<usize> {
        table.columns.column(*self).map(|_| *self)
    }
}

impl ColumnKey for str {
    fn resolve(&self, table: &Table) -> TableResult<usize> {
        table
            .columns
            .index_of(self)?
            .ok_or_else(|| TableError::ColumnNotFound {
                name: self.to_string(),
                table: table.name.clone(),
            })
    }
}

impl ColumnKey for String {
    fn resolve(&self, table: &Table) -> TableResult<usize> {
        self.as_str().resolve(table)
    }
}

impl<T: ColumnKey + ?Sized> ColumnKey for &T {
    fn resolve(&self, table: &Table) -> TableResult<usize> {
        (**self).resolve(table)
    }
}

/// An in-memory table of multi-version rows.
///
/// # Example
///
/// ```rust
/// use nexus_common::types::RowState;
/// use nexus_table::{Column, DataType, Table, Value};
///
/// let mut table = Table::new("people");
/// table.add_column(Column::not_null("id", DataType::Int)).unwrap();
/// table.add_column(Column::new("name", DataType::Text)).unwrap();
///
/// let row = table.add_row_values(&[Value::int(1), Value::string("a")]).unwrap();
/// assert_eq!(table.row_state(row).unwrap(), RowState::Added);
///
/// table.accept_changes(row).unwrap();
/// table.set_value(row, "name", "b").unwrap();
/// assert_eq!(table.row_state(row).unwrap(), RowState::Modified);
/// ```
pub struct Table {
    name: String,
    config: TableConfig,
    columns: ColumnSet,
    storages: Vec<ColumnStorage>,
    arena: SlotArena,
    rows: RowCollection,
    listeners: Listeners,
    /// Number of notification walks in progress.
    dispatch_depth: usize,
    row_initializer: Option<RowInitializer>,
}

impl Table {
    /// Creates an empty table with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), TableConfig::default())
    }

    /// Creates an empty table with `config`.
    pub fn with_config(name: impl Into<String>, config: TableConfig) -> TableResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(name.into(), config))
    }

    /// Starts building a table.
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    fn from_parts(name: String, config: TableConfig) -> Self {
        let arena = SlotArena::new(&config);
        debug!(table = %name, capacity = arena.capacity(), "created table");
        Self {
            name,
            config,
            columns: ColumnSet::new(),
            storages: Vec::new(),
            arena,
            rows: RowCollection::new(),
            listeners: Listeners::default(),
            dispatch_depth: 0,
            row_initializer: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the table.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Table configuration.
    #[inline]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The column definitions.
    #[inline]
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Returns the column named by `key`.
    pub fn column(&self, key: impl ColumnKey) -> TableResult<&Column> {
        let ordinal = key.resolve(self)?;
        self.columns.column(ordinal)
    }

    /// The row collection.
    #[inline]
    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    /// The slot arena.
    #[inline]
    pub fn arena(&self) -> &SlotArena {
        &self.arena
    }

    /// Number of attached rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no row is attached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row for `handle`.
    pub fn row(&self, handle: RowHandle) -> TableResult<&Row> {
        self.rows.get(handle)
    }

    /// Returns the derived state of a row.
    pub fn row_state(&self, handle: RowHandle) -> TableResult<RowState> {
        Ok(self.rows.get(handle)?.state())
    }

    /// Handle of the attached row at `index`.
    pub fn row_at(&self, index: usize) -> TableResult<RowHandle> {
        self.rows.handle_at(index).ok_or(TableError::RowNotInTable)
    }

    /// Returns true while a notification is being dispatched.
    #[inline]
    pub fn is_notifying(&self) -> bool {
        self.dispatch_depth > 0
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a listener. Listeners are notified in registration order.
    pub fn add_listener<L: TableListener + 'static>(
        &mut self,
        listener: Rc<RefCell<L>>,
    ) -> ListenerId {
        self.add_shared_listener(listener)
    }

    /// Registers an already type-erased listener.
    pub fn add_shared_listener(&mut self, listener: SharedListener) -> ListenerId {
        let id = self.listeners.add(listener);
        debug!(table = %self.name, listener = id.as_u64(), "registered listener");
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Calls `call` on every listener in registration order, stopping at the
    /// first error. A listener already running further up the stack is
    /// skipped.
    pub(crate) fn dispatch<F>(&mut self, mut call: F) -> TableResult<()>
    where
        F: FnMut(&mut dyn TableListener, &mut Table) -> TableResult<()>,
    {
        let listeners = self.listeners.snapshot();
        if listeners.is_empty() {
            return Ok(());
        }

        self.dispatch_depth += 1;
        let mut result = Ok(());
        for listener in &listeners {
            let Ok(mut listener) = listener.try_borrow_mut() else {
                trace!(table = %self.name, "skipping listener already running");
                continue;
            };
            if let Err(err) = call(&mut *listener, self) {
                result = Err(err);
                break;
            }
        }
        self.dispatch_depth -= 1;
        result
    }

    /// Dispatches a notification that cannot fail.
    pub(crate) fn notify<F>(&mut self, mut call: F)
    where
        F: FnMut(&mut dyn TableListener, &mut Table),
    {
        // Infallible callbacks always yield Ok
        let _ = self.dispatch(|listener, table| {
            call(listener, table);
            Ok(())
        });
    }

    pub(crate) fn row_changing(&mut self, row: RowHandle, action: RowAction) -> TableResult<()> {
        self.dispatch(|listener, table| listener.row_changing(table, row, action))
    }

    pub(crate) fn row_changed(&mut self, row: RowHandle, action: RowAction) {
        self.notify(|listener, table| listener.row_changed(table, row, action));
    }

    pub(crate) fn child_check(&mut self, row: RowHandle, action: RowAction) -> TableResult<()> {
        self.dispatch(|listener, table| listener.child_check(table, row, action))
    }

    pub(crate) fn ensure_unlocked(&self, operation: &'static str) -> TableResult<()> {
        if self.is_notifying() {
            return Err(TableError::SchemaLocked { operation });
        }
        Ok(())
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Allocates a slot, growing every column storage when the arena grows.
    pub(crate) fn allocate_slot(&mut self) -> TableResult<SlotId> {
        let allocation = self.arena.allocate()?;
        if let Some(capacity) = allocation.grow_to {
            for storage in &mut self.storages {
                storage.set_capacity(capacity);
            }
        }
        Ok(allocation.slot)
    }

    pub(crate) fn dispose_slot(&mut self, slot: SlotId) {
        self.arena.dispose(slot);
    }

    /// Copies every column value of slot `from` into slot `to`.
    pub(crate) fn copy_slot(&mut self, from: SlotId, to: SlotId) {
        for storage in &mut self.storages {
            storage.copy_value(from, to);
        }
    }

    /// Disposes every slot a row references and clears its versions.
    pub(crate) fn dispose_row_slots(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get_mut(handle)?;
        let slots: Vec<SlotId> = row.slots().collect();
        row.set_original(None);
        row.set_current(None);
        row.set_proposed(None);
        row.clear_changed();
        for slot in slots {
            self.dispose_slot(slot);
        }
        Ok(())
    }

    /// Removes a row from the collection and frees all its data.
    pub(crate) fn detach_row(&mut self, handle: RowHandle) -> TableResult<()> {
        self.rows.detach(handle)?;
        self.dispose_row_slots(handle)?;
        trace!(table = %self.name, row = %handle, "detached row");
        Ok(())
    }

    /// Drops a row that never made it into the collection.
    fn discard_row(&mut self, handle: RowHandle) {
        if self.detach_row(handle).is_ok() {
            let _ = self.rows.release(handle);
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Coerces `value` for the column at `ordinal` and checks its length.
    pub(crate) fn check_value(&self, ordinal: usize, value: &Value) -> TableResult<Value> {
        let column = self.columns.column(ordinal)?;
        let coerced = self.storages[ordinal]
            .coerce(value)
            .map_err(|err| err.for_column(column.name()))?;

        if let (Some(max_length), Some(length)) =
            (column.max_length(), Column::value_length(&coerced))
        {
            if length > max_length {
                return Err(TableError::MaxLengthExceeded {
                    column: column.name().to_string(),
                    length,
                    max_length,
                });
            }
        }
        Ok(coerced)
    }

    /// Stores a checked value and advances the column's ratchet.
    pub(crate) fn store_value(&mut self, ordinal: usize, slot: SlotId, value: &Value) -> TableResult<()> {
        if let Err(err) = self.storages[ordinal].set(slot, value) {
            return Err(err.for_column(self.columns.column(ordinal)?.name()));
        }
        self.observe_auto_increment(ordinal, value);
        Ok(())
    }

    pub(crate) fn observe_auto_increment(&mut self, ordinal: usize, value: &Value) {
        if let (Some(counter), Some(v)) = (
            self.columns
                .get_mut(ordinal)
                .and_then(Column::auto_increment_mut),
            value.to_i64(),
        ) {
            counter.observe(v);
        }
    }

    /// Writes the column default, or the next generated value, into `slot`.
    pub(crate) fn fill_default(&mut self, ordinal: usize, slot: SlotId) -> TableResult<()> {
        let generated = self
            .columns
            .get_mut(ordinal)
            .and_then(Column::auto_increment_mut)
            .map(AutoIncrement::take_next);

        match generated {
            Some(next) => {
                let value = Value::BigInt(next);
                if let Err(err) = self.storages[ordinal].set(slot, &value) {
                    return Err(err.for_column(self.columns.column(ordinal)?.name()));
                }
            }
            None => {
                let default_slot = self.arena.default_slot();
                self.storages[ordinal].copy_value(default_slot, slot);
            }
        }
        Ok(())
    }

    /// Reads a column of a row in the given version.
    pub fn value(
        &self,
        handle: RowHandle,
        key: impl ColumnKey,
        version: RowVersion,
    ) -> TableResult<Value> {
        let ordinal = key.resolve(self)?;
        let slot = self.rows.get(handle)?.slot_for(version)?;
        Ok(self.storages[ordinal].get(slot))
    }

    /// Reads a column of a row in its default version.
    pub fn get(&self, handle: RowHandle, key: impl ColumnKey) -> TableResult<Value> {
        self.value(handle, key, RowVersion::Default)
    }

    /// Returns true if the column holds null in the given version.
    pub fn is_null(
        &self,
        handle: RowHandle,
        key: impl ColumnKey,
        version: RowVersion,
    ) -> TableResult<bool> {
        let ordinal = key.resolve(self)?;
        let slot = self.rows.get(handle)?.slot_for(version)?;
        Ok(self.storages[ordinal].is_null(slot))
    }

    /// Returns true if the row has data in `version`.
    pub fn has_version(&self, handle: RowHandle, version: RowVersion) -> TableResult<bool> {
        Ok(self.rows.get(handle)?.has_version(version))
    }

    /// Reads every column of a row in its default version.
    pub fn item_array(&self, handle: RowHandle) -> TableResult<Vec<Value>> {
        self.version_values(handle, RowVersion::Default)
    }

    /// Reads every column of a row in the given version.
    pub fn version_values(&self, handle: RowHandle, version: RowVersion) -> TableResult<Vec<Value>> {
        let slot = self.rows.get(handle)?.slot_for(version)?;
        Ok(self.storages.iter().map(|storage| storage.get(slot)).collect())
    }

    /// Returns the null-rule violation of `slot`, if any.
    pub(crate) fn check_nulls(&self, slot: SlotId) -> TableResult<()> {
        if !self.config.enforce_constraints {
            return Ok(());
        }
        for (column, storage) in self.columns.iter().zip(&self.storages) {
            if !column.allow_null() && storage.is_null(slot) {
                return Err(TableError::NullConstraintViolation {
                    column: column.name().to_string(),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Records and rows
    // ========================================================================

    /// Creates a detached row seeded with defaults and generated values.
    ///
    /// The new values sit in the row's proposed version until the row is
    /// added to the table.
    pub fn new_row(&mut self) -> TableResult<RowHandle> {
        let slot = self.create_record(&[])?;
        let handle = self.rows.create();
        self.rows.get_mut(handle)?.set_proposed(Some(slot));

        if let Some(mut initializer) = self.row_initializer.take() {
            let result = initializer(self, handle);
            self.row_initializer = Some(initializer);
            if let Err(err) = result {
                self.discard_row(handle);
                return Err(err);
            }
        }

        trace!(table = %self.name, row = %handle, slot = %slot, "new row");
        self.notify(|listener, table| listener.table_new_row(table, handle));
        Ok(handle)
    }

    /// Allocates a slot filled from positional `values`.
    ///
    /// Missing trailing values and nulls take the column default (or the
    /// next generated value). On failure the slot is returned to the arena.
    pub(crate) fn create_record(&mut self, values: &[Value]) -> TableResult<SlotId> {
        if values.len() > self.columns.len() {
            return Err(TableError::TooManyValues {
                given: values.len(),
                columns: self.columns.len(),
            });
        }

        let slot = self.allocate_slot()?;
        if let Err(err) = self.fill_record(slot, values) {
            self.dispose_slot(slot);
            return Err(err);
        }
        Ok(slot)
    }

    fn fill_record(&mut self, slot: SlotId, values: &[Value]) -> TableResult<()> {
        for ordinal in 0..self.columns.len() {
            match values.get(ordinal) {
                Some(value) if !value.is_null() => {
                    let checked = self.check_value(ordinal, value)?;
                    self.store_value(ordinal, slot, &checked)?;
                }
                _ => self.fill_default(ordinal, slot)?,
            }
        }
        Ok(())
    }

    /// Attaches a row created by [`new_row`](Self::new_row).
    ///
    /// The row's pending values become its current version and the row
    /// lands in the `Added` state.
    pub fn add_row(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        if row.is_attached() {
            return Err(TableError::RowAlreadyAttached { handle });
        }
        row.edit_flag().check("add_row")?;

        self.begin_edit(handle)?;
        let slot = self.rows.get(handle)?.slot_for(RowVersion::Proposed)?;
        self.check_nulls(slot)?;
        self.attach_row(handle, RowAction::Add)
    }

    /// Creates a row from positional values and attaches it as `Added`.
    pub fn add_row_values(&mut self, values: &[Value]) -> TableResult<RowHandle> {
        self.insert_record(values, RowAction::Add)
    }

    /// Bulk-loads a row. With `accept` the row lands `Unchanged`, otherwise
    /// `Added`.
    pub fn load_row(&mut self, values: &[Value], accept: bool) -> TableResult<RowHandle> {
        let action = if accept {
            RowAction::ChangeCurrentAndOriginal
        } else {
            RowAction::Add
        };
        self.insert_record(values, action)
    }

    fn insert_record(&mut self, values: &[Value], action: RowAction) -> TableResult<RowHandle> {
        let slot = self.create_record(values)?;
        let handle = self.rows.create();
        self.rows.get_mut(handle)?.set_proposed(Some(slot));

        let result = self
            .check_nulls(slot)
            .and_then(|()| self.attach_row(handle, action));
        if let Err(err) = result {
            self.discard_row(handle);
            return Err(err);
        }
        Ok(handle)
    }

    /// Appends a detached row to the collection, committing its proposed
    /// version.
    pub(crate) fn attach_row(&mut self, handle: RowHandle, action: RowAction) -> TableResult<()> {
        let flag = self.rows.get(handle)?.edit_flag().clone();
        {
            let _guard = flag.acquire("add_row")?;
            self.row_changing(handle, action)?;
        }

        self.rows.attach(handle)?;
        let row = self.rows.get_mut(handle)?;
        let original = row.original();
        let mut disposed = Vec::new();
        if let Some(proposed) = row.take_proposed() {
            if let Some(current) = row.current().filter(|c| Some(*c) != original) {
                disposed.push(current);
            }
            row.set_current(Some(proposed));
        }
        if action == RowAction::ChangeCurrentAndOriginal {
            let current = row.current();
            if let Some(old) = original.filter(|o| Some(*o) != current) {
                disposed.push(old);
            }
            row.set_original(current);
        }
        for slot in disposed {
            self.dispose_slot(slot);
        }

        trace!(table = %self.name, row = %handle, %action, "attached row");
        self.row_changed(handle, action);
        Ok(())
    }

    /// Deletes a row and, unless the delete already detached it, accepts
    /// the deletion. The row's record is dropped, so the handle is invalid
    /// afterwards.
    pub fn remove_row(&mut self, handle: RowHandle) -> TableResult<()> {
        if !self.rows.get(handle)?.is_attached() {
            return Err(TableError::RowNotInTable);
        }
        self.delete(handle)?;
        if self.rows.get(handle)?.is_attached() {
            self.accept_changes(handle)?;
        }
        self.release_row(handle)
    }

    /// Removes the attached row at `index`.
    pub fn remove_at(&mut self, index: usize) -> TableResult<()> {
        let handle = self.row_at(index)?;
        self.remove_row(handle)
    }

    /// Drops the record of a detached row, freeing any data it still holds.
    ///
    /// Rows detached by `accept_changes`, `reject_changes` or `delete` keep
    /// their record until released. The handle is invalid afterwards.
    pub fn release_row(&mut self, handle: RowHandle) -> TableResult<()> {
        let row = self.rows.get(handle)?;
        if row.is_attached() {
            return Err(TableError::RowAlreadyAttached { handle });
        }
        row.edit_flag().check("release_row")?;
        self.dispose_row_slots(handle)?;
        self.rows.release(handle)?;
        Ok(())
    }

    /// Detaches every attached row, returns its slots to the arena and
    /// drops its record. Rows that were never attached are kept.
    pub fn clear(&mut self) -> TableResult<()> {
        self.ensure_unlocked("clear the table")?;
        self.notify(|listener, table| listener.table_clearing(table));

        let handles = self.rows.handles().to_vec();
        for handle in &handles {
            self.detach_row(*handle)?;
            self.rows.release(*handle)?;
        }

        debug!(table = %self.name, rows = handles.len(), "cleared table");
        self.notify(|listener, table| listener.table_cleared(table));
        Ok(())
    }

    // ========================================================================
    // Table-wide change tracking
    // ========================================================================

    /// Accepts the pending changes of every attached row.
    pub fn accept_all_changes(&mut self) -> TableResult<()> {
        let handles = self.rows.handles().to_vec();
        for handle in handles {
            // Earlier accepts may detach later rows through cascades
            if self.rows.get(handle).is_ok_and(Row::is_attached) {
                self.accept_changes(handle)?;
            }
        }
        Ok(())
    }

    /// Rejects the pending changes of every attached row.
    pub fn reject_all_changes(&mut self) -> TableResult<()> {
        let handles = self.rows.handles().to_vec();
        for handle in handles {
            if self.rows.get(handle).is_ok_and(Row::is_attached) {
                self.reject_changes(handle)?;
            }
        }
        Ok(())
    }

    /// Returns true if an attached row is in one of `states`.
    pub fn has_changes(&self, states: RowStates) -> bool {
        self.rows.iter().any(|row| states.matches(row.state()))
    }

    /// Handles of the attached rows in one of `states`, in row order.
    pub fn changed_rows(&self, states: RowStates) -> Vec<RowHandle> {
        self.rows
            .iter()
            .filter(|row| states.matches(row.state()))
            .map(Row::handle)
            .collect()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns.len())
            .field("rows", &self.rows.len())
            .field("slots", &self.arena.allocated_count())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn people() -> Table {
        let mut table = Table::with_config("people", TableConfig::for_testing()).unwrap();
        table
            .add_column(Column::not_null("id", DataType::Int).with_unique(true))
            .unwrap();
        table.add_column(Column::new("name", DataType::Text)).unwrap();
        table
    }

    #[test]
    fn test_new_row_is_detached() {
        let mut table = people();
        let row = table.new_row().unwrap();
        assert_eq!(table.row_state(row).unwrap(), RowState::Detached);
        assert_eq!(table.len(), 0);
        assert!(table.has_version(row, RowVersion::Proposed).unwrap());
        assert_eq!(table.get(row, "name").unwrap(), Value::Null);
    }

    #[test]
    fn test_add_row() {
        let mut table = people();
        let row = table.new_row().unwrap();
        table.set_value(row, "id", 1).unwrap();
        table.add_row(row).unwrap();

        assert_eq!(table.row_state(row).unwrap(), RowState::Added);
        assert_eq!(table.len(), 1);
        assert!(!table.has_version(row, RowVersion::Proposed).unwrap());
        assert!(matches!(
            table.add_row(row),
            Err(TableError::RowAlreadyAttached { .. })
        ));
    }

    #[test]
    fn test_add_row_checks_nulls() {
        let mut table = people();
        let row = table.new_row().unwrap();
        let err = table.add_row(row).unwrap_err();
        assert_eq!(
            err,
            TableError::NullConstraintViolation {
                column: "id".to_string()
            }
        );
        assert_eq!(table.len(), 0);
        assert_eq!(table.row_state(row).unwrap(), RowState::Detached);
    }

    #[test]
    fn test_add_row_values_and_lookup() {
        let mut table = people();
        let row = table
            .add_row_values(&[Value::int(7), Value::string("x")])
            .unwrap();
        assert_eq!(table.row_at(0).unwrap(), row);
        assert_eq!(table.get(row, 0usize).unwrap(), Value::int(7));
        assert_eq!(table.get(row, "NAME").unwrap(), Value::string("x"));
        assert!(matches!(
            table.get(row, "missing"),
            Err(TableError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            table.get(row, 9usize),
            Err(TableError::OrdinalOutOfRange { .. })
        ));
    }

    #[test]
    fn test_create_record_failure_frees_slot() {
        let mut table = people();
        let before = table.arena().allocated_count();

        let err = table
            .add_row_values(&[Value::string("not a number")])
            .unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { .. }));
        assert_eq!(table.arena().allocated_count(), before);

        let err = table
            .add_row_values(&[Value::int(1), Value::Null, Value::Null])
            .unwrap_err();
        assert!(matches!(err, TableError::TooManyValues { given: 3, .. }));
        assert_eq!(table.arena().allocated_count(), before);
    }

    #[test]
    fn test_insert_null_violation_frees_row() {
        let mut table = people();
        let records = table.rows().record_count();
        let err = table.add_row_values(&[]).unwrap_err();
        assert!(matches!(err, TableError::NullConstraintViolation { .. }));
        assert_eq!(table.rows().record_count(), records);
        assert_eq!(table.arena().populated_count(), 0);
    }

    #[test]
    fn test_load_row_accepted() {
        let mut table = people();
        let row = table.load_row(&[Value::int(1)], true).unwrap();
        assert_eq!(table.row_state(row).unwrap(), RowState::Unchanged);

        let row = table.load_row(&[Value::int(2)], false).unwrap();
        assert_eq!(table.row_state(row).unwrap(), RowState::Added);
    }

    #[test]
    fn test_arena_growth_keeps_values() {
        let mut table = people();
        let rows: Vec<_> = (0..20)
            .map(|i| table.add_row_values(&[Value::int(i)]).unwrap())
            .collect();
        assert!(table.arena().capacity() >= 21);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(table.get(*row, "id").unwrap(), Value::int(i as i32));
        }
    }

    #[test]
    fn test_remove_row() {
        let mut table = people();
        let added = table.add_row_values(&[Value::int(1)]).unwrap();
        let loaded = table.load_row(&[Value::int(2)], true).unwrap();

        let pending = table.new_row().unwrap();

        table.remove_row(added).unwrap();
        assert!(matches!(table.row(added), Err(TableError::UnknownRow { .. })));

        table.remove_at(0).unwrap();
        assert!(matches!(table.row(loaded), Err(TableError::UnknownRow { .. })));
        assert!(table.is_empty());
        assert_eq!(table.rows().record_count(), 1);

        assert_eq!(table.remove_row(pending), Err(TableError::RowNotInTable));
        table.release_row(pending).unwrap();
        assert_eq!(table.rows().record_count(), 0);
        assert_eq!(table.arena().populated_count(), 0);
    }

    #[test]
    fn test_clear_frees_all_slots() {
        let mut table = people();
        for i in 0..5 {
            table.load_row(&[Value::int(i)], true).unwrap();
        }
        let row = table.row_at(0).unwrap();
        table.set_value(row, "name", "changed").unwrap();

        let pending = table.new_row().unwrap();

        table.clear().unwrap();
        assert!(table.is_empty());
        assert!(matches!(table.row(row), Err(TableError::UnknownRow { .. })));
        assert_eq!(table.rows().record_count(), 1);
        assert!(table.row(pending).unwrap().is_editing());
        assert_eq!(table.arena().populated_count(), 1);
    }

    #[test]
    fn test_release_row() {
        let mut table = people();
        let row = table.new_row().unwrap();
        assert_eq!(table.arena().populated_count(), 1);

        table.release_row(row).unwrap();
        assert_eq!(table.arena().populated_count(), 0);
        assert!(matches!(table.row(row), Err(TableError::UnknownRow { .. })));
    }

    #[test]
    fn test_changed_rows() {
        let mut table = people();
        let unchanged = table.load_row(&[Value::int(1)], true).unwrap();
        let added = table.add_row_values(&[Value::int(2)]).unwrap();

        assert!(table.has_changes(RowStates::CHANGED));
        assert_eq!(table.changed_rows(RowStates::ADDED), vec![added]);
        assert_eq!(table.changed_rows(RowStates::UNCHANGED), vec![unchanged]);

        table.accept_all_changes().unwrap();
        assert!(!table.has_changes(RowStates::CHANGED));
    }

    #[test]
    fn test_reject_all_changes() {
        let mut table = people();
        let kept = table.load_row(&[Value::int(1), "a".into()], true).unwrap();
        table.add_row_values(&[Value::int(2)]).unwrap();
        table.set_value(kept, "name", "b").unwrap();

        table.reject_all_changes().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(kept, "name").unwrap(), Value::string("a"));
        assert_eq!(table.row_state(kept).unwrap(), RowState::Unchanged);
    }
}

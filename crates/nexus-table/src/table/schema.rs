//! Schema evolution.
//!
//! Every mutation keeps `storages` parallel to the column set and fails with
//! `SchemaLocked` while a notification is being dispatched.

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowVersion, SlotId};
use tracing::debug;

use super::{ColumnKey, Table};
use crate::column::{AutoIncrement, Column};
use crate::storage::ColumnStorage;
use crate::value::{DataType, Value};

impl Table {
    /// Appends a column and returns its ordinal.
    ///
    /// Existing rows take the column default. An auto-increment column
    /// added to a populated table gives every existing row one generated
    /// value, written to each version the row holds. If a generated value does
    /// not fit the column type, the column is not added.
    pub fn add_column(&mut self, column: Column) -> TableResult<usize> {
        self.ensure_unlocked("add a column")?;

        let mut storage = ColumnStorage::new(column.data_type(), self.arena.capacity());
        let default = storage
            .coerce(column.default_value())
            .map_err(|err| err.for_column(column.name()))?;
        if !default.is_null() {
            storage
                .fill(&default)
                .map_err(|err| err.for_column(column.name()))?;
        }

        let ordinal = self.columns.add(column)?;
        if let Some(column) = self.columns.get_mut(ordinal) {
            column.set_default_value(default);
        }
        self.storages.push(storage);

        if self.columns.column(ordinal)?.is_auto_increment() {
            if let Err(err) = self.number_existing_rows(ordinal) {
                self.storages.pop();
                self.columns.remove(ordinal)?;
                return Err(err);
            }
        }

        debug!(
            table = %self.name,
            column = %self.columns.column(ordinal)?.name(),
            ordinal,
            "added column"
        );
        Ok(ordinal)
    }

    /// Gives every row holding data one generated value.
    ///
    /// Attached rows are numbered in row order, detached rows after them in
    /// creation order.
    fn number_existing_rows(&mut self, ordinal: usize) -> TableResult<()> {
        let mut handles: Vec<RowHandle> = self.rows.handles().to_vec();
        let mut detached: Vec<RowHandle> = self
            .rows
            .all_rows()
            .filter(|row| !row.is_attached() && row.slots().next().is_some())
            .map(|row| row.handle())
            .collect();
        detached.sort_unstable();
        handles.extend(detached);

        for handle in handles {
            let slots: Vec<SlotId> = self.rows.get(handle)?.slots().collect();
            let Some(next) = self
                .columns
                .get_mut(ordinal)
                .and_then(Column::auto_increment_mut)
                .map(AutoIncrement::take_next)
            else {
                return Ok(());
            };
            let value = Value::BigInt(next);
            for slot in slots {
                if let Err(err) = self.storages[ordinal].set(slot, &value) {
                    return Err(err.for_column(self.columns.column(ordinal)?.name()));
                }
            }
        }
        Ok(())
    }

    /// Removes a column and its data.
    pub fn remove_column(&mut self, key: impl ColumnKey) -> TableResult<Column> {
        self.ensure_unlocked("remove a column")?;
        let ordinal = key.resolve(self)?;
        let column = self.columns.remove(ordinal)?;
        self.storages.remove(ordinal);

        debug!(table = %self.name, column = %column.name(), "removed column");
        Ok(column)
    }

    /// Moves a column to `new_ordinal`, shifting the columns in between.
    pub fn move_column(&mut self, key: impl ColumnKey, new_ordinal: usize) -> TableResult<()> {
        self.ensure_unlocked("move a column")?;
        let old = key.resolve(self)?;
        self.columns.move_column(old, new_ordinal)?;
        if old != new_ordinal {
            let storage = self.storages.remove(old);
            self.storages.insert(new_ordinal, storage);
        }
        Ok(())
    }

    /// Renames a column. On a duplicate name the column keeps its old name.
    pub fn rename_column(&mut self, key: impl ColumnKey, name: &str) -> TableResult<()> {
        self.ensure_unlocked("rename a column")?;
        let ordinal = key.resolve(self)?;
        self.columns.rename(ordinal, name)
    }

    /// Changes the type of a column.
    ///
    /// Only allowed while no slot besides the default-values slot is in use.
    pub fn set_column_type(&mut self, key: impl ColumnKey, data_type: DataType) -> TableResult<()> {
        self.ensure_unlocked("change a column type")?;
        let ordinal = key.resolve(self)?;
        let column = self.columns.column(ordinal)?;
        if column.data_type() == data_type {
            return Ok(());
        }
        if self.arena.populated_count() > 0 {
            return Err(TableError::ColumnPopulated {
                column: column.name().to_string(),
            });
        }
        if column.is_auto_increment() && !data_type.can_auto_increment() {
            return Err(TableError::invalid_column(
                column.name(),
                format!("{} columns cannot auto-increment", data_type),
            ));
        }

        let mut storage = ColumnStorage::new(data_type, self.arena.capacity());
        let default = column.default_value().clone();
        storage
            .set(self.arena.default_slot(), &default)
            .map_err(|err| err.for_column(column.name()))?;
        let default = storage.get(self.arena.default_slot());

        self.storages[ordinal] = storage;
        if let Some(column) = self.columns.get_mut(ordinal) {
            column.set_data_type(data_type);
            column.set_default_value(default);
        }
        debug!(table = %self.name, ordinal, %data_type, "changed column type");
        Ok(())
    }

    /// Sets the value new rows take for a column.
    pub fn set_default_value(
        &mut self,
        key: impl ColumnKey,
        value: impl Into<Value>,
    ) -> TableResult<()> {
        self.ensure_unlocked("change a column default")?;
        let value = value.into();
        let ordinal = key.resolve(self)?;
        let column = self.columns.column(ordinal)?;
        if column.is_auto_increment() && !value.is_null() {
            return Err(TableError::invalid_column(
                column.name(),
                "auto-increment columns cannot have a default value",
            ));
        }
        let default = self.check_value(ordinal, &value)?;

        let slot = self.arena.default_slot();
        self.store_value(ordinal, slot, &default)?;
        if let Some(column) = self.columns.get_mut(ordinal) {
            column.set_default_value(default);
        }
        Ok(())
    }

    /// Sets whether a column accepts nulls.
    ///
    /// Disallowing nulls fails if an attached row holds one.
    pub fn set_allow_null(&mut self, key: impl ColumnKey, allow: bool) -> TableResult<()> {
        self.ensure_unlocked("change a column null rule")?;
        let ordinal = key.resolve(self)?;
        if !allow {
            for slot in self.visible_slots() {
                if self.storages[ordinal].is_null(slot) {
                    return Err(TableError::NullConstraintViolation {
                        column: self.columns.column(ordinal)?.name().to_string(),
                    });
                }
            }
        }
        self.column_mut(ordinal)?.set_allow_null(allow);
        Ok(())
    }

    /// Sets whether a column rejects writes on attached rows.
    pub fn set_read_only(&mut self, key: impl ColumnKey, read_only: bool) -> TableResult<()> {
        self.ensure_unlocked("change a column read-only flag")?;
        let ordinal = key.resolve(self)?;
        self.column_mut(ordinal)?.set_read_only(read_only);
        Ok(())
    }

    /// Flags a column unique. Enforcement belongs to collaborators.
    pub fn set_unique(&mut self, key: impl ColumnKey, unique: bool) -> TableResult<()> {
        self.ensure_unlocked("change a column unique flag")?;
        let ordinal = key.resolve(self)?;
        self.column_mut(ordinal)?.set_unique(unique);
        Ok(())
    }

    /// Sets or clears a column's maximum value length.
    ///
    /// Fails if an attached row already holds a longer value.
    pub fn set_max_length(
        &mut self,
        key: impl ColumnKey,
        max_length: Option<usize>,
    ) -> TableResult<()> {
        self.ensure_unlocked("change a column max length")?;
        let ordinal = key.resolve(self)?;
        if let Some(max_length) = max_length {
            for slot in self.visible_slots() {
                let value = self.storages[ordinal].get(slot);
                if let Some(length) = Column::value_length(&value).filter(|l| *l > max_length) {
                    return Err(TableError::MaxLengthExceeded {
                        column: self.columns.column(ordinal)?.name().to_string(),
                        length,
                        max_length,
                    });
                }
            }
        }
        self.column_mut(ordinal)?.set_max_length(max_length);
        Ok(())
    }

    /// Makes a column auto-increment with `(seed, step)`, or clears the
    /// setting with `None`.
    pub fn set_auto_increment(
        &mut self,
        key: impl ColumnKey,
        settings: Option<(i64, i64)>,
    ) -> TableResult<()> {
        self.ensure_unlocked("change a column auto-increment setting")?;
        let ordinal = key.resolve(self)?;
        let column = self.columns.column(ordinal)?;
        if settings.is_some() {
            if !column.data_type().can_auto_increment() {
                return Err(TableError::invalid_column(
                    column.name(),
                    format!("{} columns cannot auto-increment", column.data_type()),
                ));
            }
            if !column.default_value().is_null() {
                return Err(TableError::invalid_column(
                    column.name(),
                    "auto-increment columns cannot have a default value",
                ));
            }
        }

        let counter = settings.map(|(seed, step)| AutoIncrement::new(seed, step));
        self.column_mut(ordinal)?.set_auto_increment(counter);
        self.columns.refresh_auto_increment();
        Ok(())
    }

    /// Sets or clears a column's caption.
    pub fn set_caption(&mut self, key: impl ColumnKey, caption: Option<String>) -> TableResult<()> {
        let ordinal = key.resolve(self)?;
        self.column_mut(ordinal)?.set_caption(caption);
        Ok(())
    }

    fn column_mut(&mut self, ordinal: usize) -> TableResult<&mut Column> {
        let count = self.columns.len();
        self.columns
            .get_mut(ordinal)
            .ok_or(TableError::OrdinalOutOfRange { ordinal, count })
    }

    /// The slot each attached row is read from: its default version, or its
    /// original version once deleted.
    fn visible_slots(&self) -> Vec<SlotId> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.slot_for(RowVersion::Default)
                    .or_else(|_| row.slot_for(RowVersion::Original))
                    .ok()
            })
            .collect()
    }
}

//! Copying rows between tables.

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowState, RowVersion, SlotId};
use tracing::trace;

use super::Table;
use crate::events::RowAction;

impl Table {
    /// Copies one version of a foreign row into a fresh slot of this table.
    ///
    /// Columns are matched by name; columns the source lacks take their
    /// default (or next generated value). Values are coerced to this
    /// table's column types, checked against max lengths and advance
    /// auto-increment counters. On failure the slot is returned to the
    /// arena.
    pub fn stage_version(
        &mut self,
        source: &Table,
        handle: RowHandle,
        version: RowVersion,
    ) -> TableResult<SlotId> {
        self.stage(source, handle, version, None)
    }

    /// Stages a version, taking columns the source lacks from `fallback`
    /// when given instead of generating fresh defaults.
    fn stage(
        &mut self,
        source: &Table,
        handle: RowHandle,
        version: RowVersion,
        fallback: Option<SlotId>,
    ) -> TableResult<SlotId> {
        let from = source.row(handle)?.slot_for(version)?;
        let slot = self.allocate_slot()?;
        if let Err(err) = self.copy_foreign(source, from, slot, fallback) {
            self.dispose_slot(slot);
            return Err(err);
        }
        Ok(slot)
    }

    fn copy_foreign(
        &mut self,
        source: &Table,
        from: SlotId,
        to: SlotId,
        fallback: Option<SlotId>,
    ) -> TableResult<()> {
        for ordinal in 0..self.columns.len() {
            let name = self.columns.column(ordinal)?.name();
            let Ok(Some(source_ordinal)) = source.columns.index_of(name) else {
                match fallback {
                    Some(fallback) => self.storages[ordinal].copy_value(fallback, to),
                    None => self.fill_default(ordinal, to)?,
                }
                continue;
            };

            let value = source.storages[source_ordinal].get(from);
            let checked = self.check_value(ordinal, &value)?;
            self.store_value(ordinal, to, &checked)?;
        }
        Ok(())
    }

    /// Imports a row of another table, preserving its state.
    ///
    /// `Added` rows arrive with one current version, `Unchanged` rows with a
    /// single slot shared by both versions, `Modified` rows with distinct
    /// original and current versions, and `Deleted` rows with only their
    /// original version. A pending edit on the source row is not carried
    /// over. Listeners see the import as an `Add`.
    pub fn import_row(&mut self, source: &Table, handle: RowHandle) -> TableResult<RowHandle> {
        let state = source.row_state(handle)?;
        let (original, current) = match state {
            RowState::Detached => return Err(TableError::RowNotInTable),
            RowState::Added => {
                let current = self.stage_version(source, handle, RowVersion::Current)?;
                (None, Some(current))
            }
            RowState::Unchanged => {
                let slot = self.stage_version(source, handle, RowVersion::Current)?;
                (Some(slot), Some(slot))
            }
            RowState::Modified => {
                // Both versions share the defaults generated for the current one
                let current = self.stage_version(source, handle, RowVersion::Current)?;
                match self.stage(source, handle, RowVersion::Original, Some(current)) {
                    Ok(original) => (Some(original), Some(current)),
                    Err(err) => {
                        self.dispose_slot(current);
                        return Err(err);
                    }
                }
            }
            RowState::Deleted => {
                let original = self.stage_version(source, handle, RowVersion::Original)?;
                (Some(original), None)
            }
        };

        let imported = self.rows.create();
        let row = self.rows.get_mut(imported)?;
        row.set_original(original);
        row.set_current(current);
        let flag = row.edit_flag().clone();

        let result = {
            let _guard = flag.acquire("import_row")?;
            self.row_changing(imported, RowAction::Add)
        };
        if let Err(err) = result.and_then(|()| self.rows.attach(imported).map(|_| ())) {
            self.discard_row(imported);
            return Err(err);
        }

        trace!(
            table = %self.name,
            source = %source.name,
            row = %imported,
            %state,
            "imported row"
        );
        self.row_changed(imported, RowAction::Add);
        Ok(imported)
    }
}

//! Row identity.
//!
//! A [`Row`] owns no values. It references up to three slots of its table
//! (original, current and proposed) and derives its [`RowState`] from which
//! of them are present. The table drives every transition; this module only
//! holds the slot graph and answers version queries.

mod guard;

pub use guard::{EditFlag, EditGuard};

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowId, RowState, RowVersion, SlotId};

/// Slot references of one row.
#[derive(Debug, Clone)]
pub struct Row {
    handle: RowHandle,
    original: Option<SlotId>,
    current: Option<SlotId>,
    proposed: Option<SlotId>,
    row_id: Option<RowId>,
    /// Set when a value is written during the pending edit.
    changed: bool,
    editing: EditFlag,
}

impl Row {
    /// Creates a detached row with no data.
    pub(crate) fn new(handle: RowHandle) -> Self {
        Self {
            handle,
            original: None,
            current: None,
            proposed: None,
            row_id: None,
            changed: false,
            editing: EditFlag::new(),
        }
    }

    /// Stable identity of the row.
    #[inline]
    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    /// Original version slot.
    #[inline]
    pub fn original(&self) -> Option<SlotId> {
        self.original
    }

    /// Current version slot.
    #[inline]
    pub fn current(&self) -> Option<SlotId> {
        self.current
    }

    /// Proposed version slot.
    #[inline]
    pub fn proposed(&self) -> Option<SlotId> {
        self.proposed
    }

    /// Position in the row collection, `None` while detached.
    #[inline]
    pub fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    /// Returns true while the row is part of its table's row collection.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.row_id.is_some()
    }

    /// Returns the derived state.
    #[inline]
    pub fn state(&self) -> RowState {
        RowState::classify(self.original, self.current)
    }

    /// Returns true if a proposed version is pending.
    #[inline]
    pub fn is_editing(&self) -> bool {
        self.proposed.is_some()
    }

    /// Returns true if a value was written during the pending edit.
    #[inline]
    pub fn has_pending_change(&self) -> bool {
        self.changed
    }

    /// The row's reentrancy flag.
    #[inline]
    pub fn edit_flag(&self) -> &EditFlag {
        &self.editing
    }

    /// Returns true if `version` can be read.
    pub fn has_version(&self, version: RowVersion) -> bool {
        match version {
            RowVersion::Default => self.proposed.is_some() || self.current.is_some(),
            RowVersion::Proposed => self.proposed.is_some(),
            RowVersion::Current => self.current.is_some(),
            RowVersion::Original => self.original.is_some(),
        }
    }

    /// Resolves `version` to a slot.
    ///
    /// The default version is the proposed one while an edit is pending and
    /// the current one otherwise.
    pub fn slot_for(&self, version: RowVersion) -> TableResult<SlotId> {
        if self.original.is_none() && self.current.is_none() && self.proposed.is_none() {
            return Err(TableError::RowNotInTable);
        }

        let deleted = self.state() == RowState::Deleted;
        match version {
            RowVersion::Default => self
                .proposed
                .or(self.current)
                .ok_or(TableError::DeletedRowInaccessible),
            RowVersion::Current => match self.current {
                Some(slot) => Ok(slot),
                None if deleted => Err(TableError::DeletedRowInaccessible),
                None => Err(TableError::VersionNotFound { version }),
            },
            RowVersion::Proposed => self
                .proposed
                .ok_or(TableError::VersionNotFound { version }),
            RowVersion::Original => self
                .original
                .ok_or(TableError::VersionNotFound { version }),
        }
    }

    /// Every distinct slot the row references.
    pub fn slots(&self) -> impl Iterator<Item = SlotId> {
        let original = self.original;
        let current = self.current.filter(|c| Some(*c) != original);
        let proposed = self
            .proposed
            .filter(|p| Some(*p) != original && Some(*p) != self.current);
        original.into_iter().chain(current).chain(proposed)
    }

    pub(crate) fn set_original(&mut self, slot: Option<SlotId>) {
        self.original = slot;
    }

    pub(crate) fn set_current(&mut self, slot: Option<SlotId>) {
        self.current = slot;
    }

    pub(crate) fn set_proposed(&mut self, slot: Option<SlotId>) {
        self.proposed = slot;
    }

    pub(crate) fn take_proposed(&mut self) -> Option<SlotId> {
        self.changed = false;
        self.proposed.take()
    }

    pub(crate) fn set_row_id(&mut self, row_id: Option<RowId>) {
        self.row_id = row_id;
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u32) -> Option<SlotId> {
        Some(SlotId::new(n))
    }

    fn row(original: Option<SlotId>, current: Option<SlotId>) -> Row {
        let mut row = Row::new(RowHandle::new(1));
        row.set_original(original);
        row.set_current(current);
        row
    }

    #[test]
    fn test_state_derivation() {
        assert_eq!(row(None, None).state(), RowState::Detached);
        assert_eq!(row(None, slot(1)).state(), RowState::Added);
        assert_eq!(row(slot(1), slot(1)).state(), RowState::Unchanged);
        assert_eq!(row(slot(1), slot(2)).state(), RowState::Modified);
        assert_eq!(row(slot(1), None).state(), RowState::Deleted);
    }

    #[test]
    fn test_default_version_prefers_proposed() {
        let mut r = row(slot(1), slot(1));
        assert_eq!(r.slot_for(RowVersion::Default).unwrap(), SlotId::new(1));

        r.set_proposed(slot(3));
        assert_eq!(r.slot_for(RowVersion::Default).unwrap(), SlotId::new(3));
        assert!(r.is_editing());
    }

    #[test]
    fn test_version_errors() {
        let detached = row(None, None);
        assert_eq!(
            detached.slot_for(RowVersion::Original),
            Err(TableError::RowNotInTable)
        );

        let deleted = row(slot(1), None);
        assert_eq!(
            deleted.slot_for(RowVersion::Default),
            Err(TableError::DeletedRowInaccessible)
        );
        assert_eq!(
            deleted.slot_for(RowVersion::Current),
            Err(TableError::DeletedRowInaccessible)
        );
        assert_eq!(deleted.slot_for(RowVersion::Original).unwrap(), SlotId::new(1));

        let added = row(None, slot(2));
        assert_eq!(
            added.slot_for(RowVersion::Original),
            Err(TableError::VersionNotFound {
                version: RowVersion::Original
            })
        );
        assert_eq!(
            added.slot_for(RowVersion::Proposed),
            Err(TableError::VersionNotFound {
                version: RowVersion::Proposed
            })
        );
    }

    #[test]
    fn test_new_row_with_proposed_only() {
        let mut r = Row::new(RowHandle::new(7));
        r.set_proposed(slot(4));
        assert_eq!(r.state(), RowState::Detached);
        assert!(r.has_version(RowVersion::Default));
        assert!(!r.has_version(RowVersion::Current));
        assert_eq!(
            r.slot_for(RowVersion::Current),
            Err(TableError::VersionNotFound {
                version: RowVersion::Current
            })
        );
    }

    #[test]
    fn test_distinct_slots() {
        let mut r = row(slot(1), slot(1));
        r.set_proposed(slot(2));
        assert_eq!(r.slots().collect::<Vec<_>>(), vec![SlotId::new(1), SlotId::new(2)]);

        let r = row(slot(1), slot(3));
        assert_eq!(r.slots().count(), 2);
    }
}

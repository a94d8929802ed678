//! Row state and version vocabulary.
//!
//! A row holds up to three physical versions of its data. Which of them are
//! present determines the row's [`RowState`]; callers pick a version to read
//! with [`RowVersion`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived classification of a row.
///
/// The state is never stored. It is computed from which of the original and
/// current versions are present and whether they refer to the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowState {
    /// Neither original nor current data exists.
    Detached,
    /// Original and current are the same record.
    Unchanged,
    /// Only current data exists.
    Added,
    /// Only original data exists.
    Deleted,
    /// Original and current are distinct records.
    Modified,
}

impl RowState {
    /// Classifies a row from its version slots.
    ///
    /// `original` and `current` are opaque slot keys; only presence and
    /// equality matter.
    #[must_use]
    pub fn classify<T: PartialEq>(original: Option<T>, current: Option<T>) -> Self {
        match (original, current) {
            (None, None) => RowState::Detached,
            (None, Some(_)) => RowState::Added,
            (Some(_), None) => RowState::Deleted,
            (Some(o), Some(c)) if o == c => RowState::Unchanged,
            (Some(_), Some(_)) => RowState::Modified,
        }
    }

    /// Returns the single-bit flag for this state.
    #[must_use]
    pub const fn flag(self) -> RowStates {
        match self {
            RowState::Detached => RowStates::DETACHED,
            RowState::Unchanged => RowStates::UNCHANGED,
            RowState::Added => RowStates::ADDED,
            RowState::Deleted => RowStates::DELETED,
            RowState::Modified => RowStates::MODIFIED,
        }
    }

    /// Returns true for the states that represent pending changes.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(
            self,
            RowState::Added | RowState::Deleted | RowState::Modified
        )
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowState::Detached => write!(f, "Detached"),
            RowState::Unchanged => write!(f, "Unchanged"),
            RowState::Added => write!(f, "Added"),
            RowState::Deleted => write!(f, "Deleted"),
            RowState::Modified => write!(f, "Modified"),
        }
    }
}

bitflags::bitflags! {
    /// A set of row states, used to filter change queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowStates: u8 {
        /// Rows that are not part of the table.
        const DETACHED = 0b0000_0001;
        /// Rows without pending changes.
        const UNCHANGED = 0b0000_0010;
        /// Rows added since the last accept.
        const ADDED = 0b0000_0100;
        /// Rows deleted since the last accept.
        const DELETED = 0b0000_1000;
        /// Rows modified since the last accept.
        const MODIFIED = 0b0001_0000;
        /// Every state that represents a pending change.
        const CHANGED = Self::ADDED.bits() | Self::DELETED.bits() | Self::MODIFIED.bits();
    }
}

impl RowStates {
    /// Returns true if `state` is a member of this set.
    #[inline]
    #[must_use]
    pub fn matches(self, state: RowState) -> bool {
        self.contains(state.flag())
    }
}

/// Names one of the versions a row can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowVersion {
    /// Proposed if an edit is in progress, otherwise current.
    Default,
    /// The version as of the last accept.
    Original,
    /// The committed version.
    Current,
    /// The in-progress edit.
    Proposed,
}

impl fmt::Display for RowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowVersion::Default => write!(f, "Default"),
            RowVersion::Original => write!(f, "Original"),
            RowVersion::Current => write!(f, "Current"),
            RowVersion::Proposed => write!(f, "Proposed"),
        }
    }
}

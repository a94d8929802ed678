//! Core identifier types for the row store.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing a slot index from being mistaken for a row position or a
//! row handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot identifier - one physical record across every column storage of a table.
///
/// Slots are handed out by the table's slot arena and recycled through its
/// free list. A slot has no meaning outside the table that allocated it.
///
/// # Example
///
/// ```rust
/// use nexus_common::types::SlotId;
///
/// let slot = SlotId::new(42);
/// assert_eq!(slot.as_usize(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new `SlotId` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the slot as an index into column storage.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotId {
    #[inline]
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<SlotId> for u32 {
    #[inline]
    fn from(id: SlotId) -> Self {
        id.0
    }
}

/// Row position inside a table's row collection.
///
/// Row ids are dense: removing a row shifts every later row down by one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RowId(usize);

impl RowId {
    /// Creates a new `RowId`.
    #[inline]
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// Returns the position.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a row within its table.
///
/// Unlike [`RowId`], a handle never changes while the row exists, whether
/// the row is attached to the row collection or detached from it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RowHandle(u64);

impl RowHandle {
    /// Creates a handle from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next handle.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for RowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowHandle({})", self.0)
    }
}

impl fmt::Display for RowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a registered table listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a listener id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id() {
        let slot = SlotId::new(7);
        assert_eq!(slot.as_u32(), 7);
        assert_eq!(slot.as_usize(), 7);
        assert_eq!(format!("{:?}", slot), "SlotId(7)");
        assert_eq!(u32::from(slot), 7);
    }

    #[test]
    fn test_row_id_ordering() {
        assert!(RowId::new(1) < RowId::new(2));
        assert_eq!(RowId::new(3).to_string(), "3");
    }

    #[test]
    fn test_row_handle_next() {
        let h = RowHandle::new(1);
        assert_eq!(h.next(), RowHandle::new(2));
        assert_eq!(RowHandle::new(u64::MAX).next(), RowHandle::new(u64::MAX));
        assert_eq!(h.to_string(), "#1");
    }
}

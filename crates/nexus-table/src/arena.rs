//! Slot arena.
//!
//! The arena hands out [`SlotId`]s shared by every column storage of one
//! table and recycles disposed ids through a free list.
//!
//! # Design
//!
//! - Slot 0 is reserved for the table's default values and never disposed
//! - O(1) allocation and disposal
//! - Disposed slots are reused LIFO; their stale values stay in storage
//!   until overwritten
//! - The arena only tracks capacity. When an allocation needs more room it
//!   reports the new capacity and the table resizes every column storage
//!   before touching the slot.

use nexus_common::config::TableConfig;
use nexus_common::constants::MAX_SLOT_ID;
use nexus_common::error::{TableError, TableResult};
use nexus_common::types::SlotId;
use tracing::debug;

/// Result of [`SlotArena::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// The allocated slot.
    pub slot: SlotId,
    /// New capacity every column storage must grow to before `slot` is used.
    pub grow_to: Option<usize>,
}

/// Allocator of slot ids for one table.
#[derive(Debug, Clone)]
pub struct SlotArena {
    /// Number of slots the column storages can hold.
    capacity: usize,
    /// First slot id never handed out.
    high_water: usize,
    /// Disposed slots available for reuse.
    free_list: Vec<SlotId>,
    /// Liveness of every slot below `high_water`.
    live: Vec<bool>,
    /// Number of live slots, the default slot included.
    allocated_count: usize,
    /// Capacity multiplier on growth.
    growth_factor: usize,
}

impl SlotArena {
    /// Reserved slot holding each column's default value.
    pub const DEFAULT_SLOT: SlotId = SlotId::new(0);

    /// Creates an arena sized from `config`, with the default slot reserved.
    pub fn new(config: &TableConfig) -> Self {
        let capacity = config.minimum_capacity.max(1);
        Self {
            capacity,
            high_water: 1,
            free_list: Vec::new(),
            live: vec![true],
            allocated_count: 1,
            growth_factor: config.growth_factor.max(2),
        }
    }

    /// Returns the slot holding default values.
    #[inline]
    #[must_use]
    pub const fn default_slot(&self) -> SlotId {
        Self::DEFAULT_SLOT
    }

    /// Number of slots column storages must hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live slots, the default slot included.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Number of live slots holding row data.
    #[inline]
    #[must_use]
    pub const fn populated_count(&self) -> usize {
        self.allocated_count - 1
    }

    /// Number of slots waiting in the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns true if `slot` is currently allocated.
    #[must_use]
    pub fn is_live(&self, slot: SlotId) -> bool {
        self.live.get(slot.as_usize()).copied().unwrap_or(false)
    }

    /// Allocates a slot, recycling a disposed one when available.
    pub fn allocate(&mut self) -> TableResult<Allocation> {
        if let Some(slot) = self.free_list.pop() {
            self.live[slot.as_usize()] = true;
            self.allocated_count += 1;
            return Ok(Allocation {
                slot,
                grow_to: None,
            });
        }

        let index = self.high_water;
        let raw = u32::try_from(index)
            .ok()
            .filter(|raw| *raw <= MAX_SLOT_ID)
            .ok_or_else(|| TableError::internal("slot arena exhausted"))?;

        let grow_to = if index >= self.capacity {
            let grown = self
                .capacity
                .saturating_mul(self.growth_factor)
                .max(index + 1);
            debug!(
                from = self.capacity,
                to = grown,
                "growing slot arena"
            );
            self.capacity = grown;
            Some(grown)
        } else {
            None
        };

        self.high_water += 1;
        self.live.push(true);
        self.allocated_count += 1;

        Ok(Allocation {
            slot: SlotId::new(raw),
            grow_to,
        })
    }

    /// Returns `slot` to the free list.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is the default slot or is not allocated. Disposing a
    /// slot twice means a row still references freed data.
    pub fn dispose(&mut self, slot: SlotId) {
        assert!(
            slot != Self::DEFAULT_SLOT,
            "the default values slot cannot be disposed"
        );
        let index = slot.as_usize();
        assert!(
            self.live.get(index).copied().unwrap_or(false),
            "slot {} disposed while not allocated",
            slot
        );

        self.live[index] = false;
        self.allocated_count -= 1;
        self.free_list.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(capacity: usize) -> SlotArena {
        SlotArena::new(&TableConfig::default().with_minimum_capacity(capacity))
    }

    #[test]
    fn test_default_slot_reserved() {
        let arena = arena(4);
        assert_eq!(arena.capacity(), 4);
        assert_eq!(arena.allocated_count(), 1);
        assert_eq!(arena.populated_count(), 0);
        assert!(arena.is_live(SlotArena::DEFAULT_SLOT));
    }

    #[test]
    fn test_allocate_sequential() {
        let mut arena = arena(4);
        let a = arena.allocate().unwrap();
        let b = arena.allocate().unwrap();
        assert_eq!(a.slot, SlotId::new(1));
        assert_eq!(b.slot, SlotId::new(2));
        assert_eq!(a.grow_to, None);
        assert_eq!(arena.populated_count(), 2);
    }

    #[test]
    fn test_allocate_grows() {
        let mut arena = arena(2);
        let first = arena.allocate().unwrap();
        assert_eq!(first.grow_to, None);

        let second = arena.allocate().unwrap();
        assert_eq!(second.slot, SlotId::new(2));
        assert_eq!(second.grow_to, Some(4));
        assert_eq!(arena.capacity(), 4);
    }

    #[test]
    fn test_dispose_recycles() {
        let mut arena = arena(8);
        let a = arena.allocate().unwrap().slot;
        let b = arena.allocate().unwrap().slot;

        arena.dispose(a);
        assert!(!arena.is_live(a));
        assert_eq!(arena.free_count(), 1);

        let c = arena.allocate().unwrap();
        assert_eq!(c.slot, a);
        assert_eq!(c.grow_to, None);
        assert!(arena.is_live(b));
        assert_eq!(arena.free_count(), 0);
    }

    #[test]
    #[should_panic(expected = "disposed while not allocated")]
    fn test_double_dispose_panics() {
        let mut arena = arena(4);
        let a = arena.allocate().unwrap().slot;
        arena.dispose(a);
        arena.dispose(a);
    }

    #[test]
    #[should_panic(expected = "default values slot")]
    fn test_dispose_default_slot_panics() {
        let mut arena = arena(4);
        arena.dispose(SlotArena::DEFAULT_SLOT);
    }
}

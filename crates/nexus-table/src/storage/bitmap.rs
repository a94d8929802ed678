//! Null bitmap for column storage.
//!
//! One bit per slot, packed into 64-bit words. A set bit marks the slot's
//! value as null.

const BITS_PER_WORD: usize = 64;

/// Bit-per-slot null marker.
#[derive(Debug, Clone, Default)]
pub struct NullBitmap {
    words: Vec<u64>,
    capacity: usize,
}

impl NullBitmap {
    /// Creates a bitmap for `capacity` slots, all marked null.
    pub fn new(capacity: usize) -> Self {
        let mut bitmap = Self::default();
        bitmap.resize(capacity);
        bitmap
    }

    /// Number of slots covered.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resizes to `capacity` slots. Slots added by growth are marked null.
    pub fn resize(&mut self, capacity: usize) {
        let old = self.capacity;
        self.words.resize(capacity.div_ceil(BITS_PER_WORD), 0);
        self.capacity = capacity;

        for slot in old..capacity {
            self.set(slot, true);
        }
        if capacity < old {
            self.clear_tail();
        }
    }

    /// Returns true if `slot` is marked null. Out of range slots read as null.
    #[inline]
    pub fn is_set(&self, slot: usize) -> bool {
        if slot >= self.capacity {
            return true;
        }
        self.words[slot / BITS_PER_WORD] & (1u64 << (slot % BITS_PER_WORD)) != 0
    }

    /// Marks or clears the null bit of `slot`.
    #[inline]
    pub fn set(&mut self, slot: usize, null: bool) {
        debug_assert!(slot < self.capacity, "slot {} out of range", slot);
        let word = &mut self.words[slot / BITS_PER_WORD];
        let mask = 1u64 << (slot % BITS_PER_WORD);
        if null {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Marks every slot as null.
    pub fn set_all(&mut self) {
        for word in &mut self.words {
            *word = u64::MAX;
        }
        self.clear_tail();
    }

    /// Number of null slots.
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    // Bits past `capacity` in the last word stay zero so counts are exact.
    fn clear_tail(&mut self) {
        let used = self.capacity % BITS_PER_WORD;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

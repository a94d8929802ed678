//! Per-column value storage.
//!
//! A [`ColumnStorage`] is a typed array indexed by [`SlotId`] plus a null
//! bitmap. Every storage of a table has the same capacity; the table grows
//! them in lock-step whenever the slot arena runs out of slots.

mod bitmap;

pub use bitmap::NullBitmap;

use bytes::Bytes;
use nexus_common::types::SlotId;

use crate::value::{CastError, DataType, Value};

/// Typed backing array of a column.
#[derive(Debug, Clone)]
enum ColumnData {
    Boolean(Vec<bool>),
    SmallInt(Vec<i16>),
    Int(Vec<i32>),
    BigInt(Vec<i64>),
    Double(Vec<f64>),
    Text(Vec<String>),
    Blob(Vec<Bytes>),
    Timestamp(Vec<i64>),
}

impl ColumnData {
    fn new(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Boolean => ColumnData::Boolean(vec![false; capacity]),
            DataType::SmallInt => ColumnData::SmallInt(vec![0; capacity]),
            DataType::Int => ColumnData::Int(vec![0; capacity]),
            DataType::BigInt => ColumnData::BigInt(vec![0; capacity]),
            DataType::Double => ColumnData::Double(vec![0.0; capacity]),
            DataType::Text => ColumnData::Text(vec![String::new(); capacity]),
            DataType::Blob => ColumnData::Blob(vec![Bytes::new(); capacity]),
            DataType::Timestamp => ColumnData::Timestamp(vec![0; capacity]),
        }
    }

    fn resize(&mut self, capacity: usize) {
        match self {
            ColumnData::Boolean(v) => v.resize(capacity, false),
            ColumnData::SmallInt(v) => v.resize(capacity, 0),
            ColumnData::Int(v) => v.resize(capacity, 0),
            ColumnData::BigInt(v) | ColumnData::Timestamp(v) => v.resize(capacity, 0),
            ColumnData::Double(v) => v.resize(capacity, 0.0),
            ColumnData::Text(v) => v.resize(capacity, String::new()),
            ColumnData::Blob(v) => v.resize(capacity, Bytes::new()),
        }
    }

    fn get(&self, slot: usize) -> Value {
        match self {
            ColumnData::Boolean(v) => Value::Boolean(v[slot]),
            ColumnData::SmallInt(v) => Value::SmallInt(v[slot]),
            ColumnData::Int(v) => Value::Int(v[slot]),
            ColumnData::BigInt(v) => Value::BigInt(v[slot]),
            ColumnData::Double(v) => Value::Double(v[slot]),
            ColumnData::Text(v) => Value::String(v[slot].clone()),
            ColumnData::Blob(v) => Value::Bytes(v[slot].clone()),
            ColumnData::Timestamp(v) => Value::Timestamp(v[slot]),
        }
    }

    /// Stores an already coerced, non-null value.
    fn put(&mut self, slot: usize, value: Value) {
        match (self, value) {
            (ColumnData::Boolean(v), Value::Boolean(x)) => v[slot] = x,
            (ColumnData::SmallInt(v), Value::SmallInt(x)) => v[slot] = x,
            (ColumnData::Int(v), Value::Int(x)) => v[slot] = x,
            (ColumnData::BigInt(v), Value::BigInt(x)) => v[slot] = x,
            (ColumnData::Double(v), Value::Double(x)) => v[slot] = x,
            (ColumnData::Text(v), Value::String(x)) => v[slot] = x,
            (ColumnData::Blob(v), Value::Bytes(x)) => v[slot] = x,
            (ColumnData::Timestamp(v), Value::Timestamp(x)) => v[slot] = x,
            (data, value) => unreachable!("value {:?} was not coerced for {:?}", value, data),
        }
    }

    fn copy(&mut self, from: usize, to: usize) {
        match self {
            ColumnData::Boolean(v) => v[to] = v[from],
            ColumnData::SmallInt(v) => v[to] = v[from],
            ColumnData::Int(v) => v[to] = v[from],
            ColumnData::BigInt(v) | ColumnData::Timestamp(v) => v[to] = v[from],
            ColumnData::Double(v) => v[to] = v[from],
            ColumnData::Text(v) => v[to] = v[from].clone(),
            ColumnData::Blob(v) => v[to] = v[from].clone(),
        }
    }

    // Drop heap data held by a slot whose value became null.
    fn release(&mut self, slot: usize) {
        match self {
            ColumnData::Text(v) => v[slot] = String::new(),
            ColumnData::Blob(v) => v[slot] = Bytes::new(),
            _ => {}
        }
    }
}

/// Values of one column for every slot of a table.
///
/// # Example
///
/// ```rust
/// use nexus_common::types::SlotId;
/// use nexus_table::storage::ColumnStorage;
/// use nexus_table::{DataType, Value};
///
/// let mut storage = ColumnStorage::new(DataType::Int, 4);
/// let slot = SlotId::new(1);
/// assert!(storage.is_null(slot));
///
/// storage.set(slot, &Value::BigInt(7)).unwrap();
/// assert_eq!(storage.get(slot), Value::Int(7));
/// ```
#[derive(Debug, Clone)]
pub struct ColumnStorage {
    data_type: DataType,
    data: ColumnData,
    nulls: NullBitmap,
}

impl ColumnStorage {
    /// Creates storage for `capacity` slots, all null.
    pub fn new(data_type: DataType, capacity: usize) -> Self {
        Self {
            data_type,
            data: ColumnData::new(data_type, capacity),
            nulls: NullBitmap::new(capacity),
        }
    }

    /// Returns the storage type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of slots this storage can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nulls.capacity()
    }

    /// Grows (or shrinks) to `capacity` slots. New slots are null.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.data.resize(capacity);
        self.nulls.resize(capacity);
    }

    /// Returns the value stored in `slot`.
    pub fn get(&self, slot: SlotId) -> Value {
        let index = slot.as_usize();
        if self.nulls.is_set(index) {
            Value::Null
        } else {
            self.data.get(index)
        }
    }

    /// Returns true if `slot` holds null.
    #[inline]
    pub fn is_null(&self, slot: SlotId) -> bool {
        self.nulls.is_set(slot.as_usize())
    }

    /// Coerces `value` to the storage type without storing it.
    pub fn coerce(&self, value: &Value) -> Result<Value, CastError> {
        value.cast(self.data_type)
    }

    /// Stores `value` in `slot`, coercing it to the storage type.
    ///
    /// On a failed coercion the slot keeps its previous value.
    pub fn set(&mut self, slot: SlotId, value: &Value) -> Result<(), CastError> {
        let coerced = self.coerce(value)?;
        self.put(slot, coerced);
        Ok(())
    }

    /// Stores a value that already has the storage type.
    fn put(&mut self, slot: SlotId, value: Value) {
        let index = slot.as_usize();
        if value.is_null() {
            self.data.release(index);
            self.nulls.set(index, true);
        } else {
            self.data.put(index, value);
            self.nulls.set(index, false);
        }
    }

    /// Marks `slot` as null.
    pub fn set_null(&mut self, slot: SlotId) {
        self.put(slot, Value::Null);
    }

    /// Copies the value of slot `from` into slot `to`.
    pub fn copy_value(&mut self, from: SlotId, to: SlotId) {
        let (from, to) = (from.as_usize(), to.as_usize());
        if from == to {
            return;
        }
        if self.nulls.is_set(from) {
            self.data.release(to);
            self.nulls.set(to, true);
        } else {
            self.data.copy(from, to);
            self.nulls.set(to, false);
        }
    }

    /// Writes `value` into every slot.
    pub fn fill(&mut self, value: &Value) -> Result<(), CastError> {
        let coerced = self.coerce(value)?;
        if coerced.is_null() {
            let capacity = self.capacity();
            self.data = ColumnData::new(self.data_type, capacity);
            self.nulls.set_all();
            return Ok(());
        }
        for index in 0..self.capacity() {
            self.data.put(index, coerced.clone());
            self.nulls.set(index, false);
        }
        Ok(())
    }

    /// Returns true if slots `a` and `b` hold equal values.
    pub fn values_equal(&self, a: SlotId, b: SlotId) -> bool {
        a == b || self.get(a) == self.get(b)
    }

    /// Number of null slots, across the whole capacity.
    pub fn null_count(&self) -> usize {
        self.nulls.count_set()
    }
}

//! Column definitions and the ordered column set of a table.

mod names;
mod set;

pub use names::{NameGroups, NameLookup};
pub use set::ColumnSet;

use nexus_common::constants::{DEFAULT_AUTO_INCREMENT_SEED, DEFAULT_AUTO_INCREMENT_STEP};

use crate::value::{DataType, Value};

/// Auto-increment settings and counter of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoIncrement {
    /// First generated value.
    pub seed: i64,
    /// Distance between generated values. Never zero.
    pub step: i64,
    /// Value handed out by the next [`take_next`](Self::take_next).
    next: i64,
}

impl AutoIncrement {
    /// Creates a counter starting at `seed`.
    ///
    /// A zero step is treated as one.
    #[must_use]
    pub fn new(seed: i64, step: i64) -> Self {
        let step = if step == 0 { 1 } else { step };
        Self {
            seed,
            step,
            next: seed,
        }
    }

    /// Returns the next value without consuming it.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> i64 {
        self.next
    }

    /// Consumes and returns the next value.
    pub fn take_next(&mut self) -> i64 {
        let value = self.next;
        self.next = self.next.saturating_add(self.step);
        value
    }

    /// Advances the counter past an explicitly stored value.
    ///
    /// The counter only moves in the direction of the step.
    pub fn observe(&mut self, value: i64) {
        if self.step > 0 && value >= self.next {
            self.next = value.saturating_add(self.step);
        } else if self.step < 0 && value <= self.next {
            self.next = value.saturating_add(self.step);
        }
    }

    /// Restarts the counter at the seed.
    pub fn reset(&mut self) {
        self.next = self.seed;
    }
}

impl Default for AutoIncrement {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_INCREMENT_SEED, DEFAULT_AUTO_INCREMENT_STEP)
    }
}

/// Definition of one column.
///
/// # Example
///
/// ```rust
/// use nexus_table::{Column, DataType};
///
/// let id = Column::not_null("id", DataType::Int).with_unique(true);
/// assert!(!id.allow_null());
/// assert!(id.is_unique());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ordinal: Option<usize>,
    data_type: DataType,
    allow_null: bool,
    unique: bool,
    read_only: bool,
    auto_increment: Option<AutoIncrement>,
    max_length: Option<usize>,
    default_value: Value,
    caption: Option<String>,
}

impl Column {
    /// Creates a nullable column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            ordinal: None,
            data_type,
            allow_null: true,
            unique: false,
            read_only: false,
            auto_increment: None,
            max_length: None,
            default_value: Value::Null,
            caption: None,
        }
    }

    /// Creates a nullable column.
    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type)
    }

    /// Creates a column that rejects nulls at commit.
    pub fn not_null(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type).with_allow_null(false)
    }

    /// Creates a column with an empty name. The column set assigns a
    /// `Column<N>` name when it is added.
    pub fn unnamed(data_type: DataType) -> Self {
        Self::new(String::new(), data_type)
    }

    /// Sets whether nulls are allowed.
    #[must_use]
    pub fn with_allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Marks the column unique.
    #[must_use]
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Marks the column read-only.
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Makes the column auto-increment.
    #[must_use]
    pub fn with_auto_increment(mut self, seed: i64, step: i64) -> Self {
        self.auto_increment = Some(AutoIncrement::new(seed, step));
        self
    }

    /// Sets the maximum text length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the column set, `None` while the column is not part of one.
    #[inline]
    pub fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }

    /// Declared type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether nulls are allowed.
    #[inline]
    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    /// Whether the column is flagged unique.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the column is read-only.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether the column generates values.
    #[inline]
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment.is_some()
    }

    /// Auto-increment settings, if any.
    #[inline]
    pub fn auto_increment(&self) -> Option<&AutoIncrement> {
        self.auto_increment.as_ref()
    }

    /// Maximum text length, if any.
    #[inline]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Default value.
    #[inline]
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Caption, falling back to the name.
    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_ordinal(&mut self, ordinal: Option<usize>) {
        self.ordinal = ordinal;
    }

    pub(crate) fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub(crate) fn set_allow_null(&mut self, allow: bool) {
        self.allow_null = allow;
    }

    pub(crate) fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    pub(crate) fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub(crate) fn set_max_length(&mut self, max_length: Option<usize>) {
        self.max_length = max_length;
    }

    pub(crate) fn set_default_value(&mut self, value: Value) {
        self.default_value = value;
    }

    pub(crate) fn set_auto_increment(&mut self, auto_increment: Option<AutoIncrement>) {
        self.auto_increment = auto_increment;
    }

    pub(crate) fn set_caption(&mut self, caption: Option<String>) {
        self.caption = caption;
    }

    pub(crate) fn auto_increment_mut(&mut self) -> Option<&mut AutoIncrement> {
        self.auto_increment.as_mut()
    }

    /// Length used for the max length rule, for text and blob values.
    pub(crate) fn value_length(value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }
}

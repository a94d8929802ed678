//! Ordered, uniquely named column definitions.

use std::collections::HashMap;

use nexus_common::constants::{DEFAULT_COLUMN_PREFIX, FIRST_DEFAULT_COLUMN_INDEX};
use nexus_common::error::{TableError, TableResult};

use super::names::{NameGroups, NameLookup};
use super::Column;

/// The columns of a table, in ordinal order.
///
/// Names are unique by exact case. Lookups try the exact name first, then
/// fall back to a case-insensitive match that must be unambiguous.
///
/// # Example
///
/// ```rust
/// use nexus_table::{Column, ColumnSet, DataType};
///
/// let mut columns = ColumnSet::new();
/// columns.add(Column::new("Name", DataType::Text)).unwrap();
/// columns.add(Column::unnamed(DataType::Int)).unwrap();
///
/// assert_eq!(columns.index_of("name").unwrap(), Some(0));
/// assert_eq!(columns.get(1).unwrap().name(), "Column1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    groups: NameGroups,
    auto_increment: Vec<usize>,
    /// Where the search for the next `Column<N>` name starts.
    default_name_cursor: usize,
}

impl ColumnSet {
    /// Creates an empty column set.
    pub fn new() -> Self {
        Self {
            default_name_cursor: FIRST_DEFAULT_COLUMN_INDEX,
            ..Default::default()
        }
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column at `ordinal`.
    pub fn get(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    pub(crate) fn get_mut(&mut self, ordinal: usize) -> Option<&mut Column> {
        self.columns.get_mut(ordinal)
    }

    /// Returns the column at `ordinal` or an out-of-range error.
    pub fn column(&self, ordinal: usize) -> TableResult<&Column> {
        self.columns.get(ordinal).ok_or(TableError::OrdinalOutOfRange {
            ordinal,
            count: self.columns.len(),
        })
    }

    /// Iterates the columns in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Ordinals of the auto-increment columns.
    pub fn auto_increment_ordinals(&self) -> &[usize] {
        &self.auto_increment
    }

    /// Finds a column by name.
    ///
    /// Returns `Ok(None)` if no column matches and `AmbiguousColumn` if the
    /// name only matches several columns in different case.
    pub fn index_of(&self, name: &str) -> TableResult<Option<usize>> {
        if let Some(&ordinal) = self.by_name.get(name) {
            return Ok(Some(ordinal));
        }
        match self.groups.lookup(name) {
            NameLookup::Unique(exact) => Ok(self.by_name.get(exact).copied()),
            NameLookup::Ambiguous => Err(TableError::AmbiguousColumn {
                name: name.to_string(),
            }),
            NameLookup::Missing => Ok(None),
        }
    }

    /// Returns true if `name` resolves to exactly one column.
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.index_of(name), Ok(Some(_)))
    }

    /// Returns the next unused `Column<N>` name.
    pub fn next_default_name(&mut self) -> String {
        let mut index = self.default_name_cursor.max(FIRST_DEFAULT_COLUMN_INDEX);
        loop {
            let name = Self::make_name(index);
            index += 1;
            // Any case variant blocks the name
            if self.groups.count(&name) == 0 {
                self.default_name_cursor = index;
                return name;
            }
        }
    }

    fn make_name(index: usize) -> String {
        format!("{}{}", DEFAULT_COLUMN_PREFIX, index)
    }

    /// Appends `column`, naming it `Column<N>` if its name is empty.
    ///
    /// Returns the ordinal the column was given.
    pub fn add(&mut self, mut column: Column) -> TableResult<usize> {
        if column.name().is_empty() {
            let name = self.next_default_name();
            column.set_name(name);
        }
        if self.by_name.contains_key(column.name()) {
            return Err(TableError::DuplicateColumn {
                name: column.name().to_string(),
            });
        }
        if column.is_auto_increment() {
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

        let ordinal = self.columns.len();
        column.set_ordinal(Some(ordinal));
        self.register(column.name(), ordinal);
        if column.is_auto_increment() {
            self.auto_increment.push(ordinal);
        }
        self.columns.push(column);
        Ok(ordinal)
    }

    /// Removes the column at `ordinal`; later columns shift down by one.
    pub fn remove(&mut self, ordinal: usize) -> TableResult<Column> {
        self.column(ordinal)?;
        let mut column = self.columns.remove(ordinal);
        self.unregister(column.name());
        column.set_ordinal(None);
        self.reindex();
        Ok(column)
    }

    /// Moves the column at `old` to `new`, shifting the columns in between.
    pub fn move_column(&mut self, old: usize, new: usize) -> TableResult<()> {
        self.column(old)?;
        if new >= self.columns.len() {
            return Err(TableError::OrdinalOutOfRange {
                ordinal: new,
                count: self.columns.len(),
            });
        }
        if old == new {
            return Ok(());
        }

        let column = self.columns.remove(old);
        self.columns.insert(new, column);
        self.reindex();
        Ok(())
    }

    /// Renames the column at `ordinal`.
    ///
    /// On a duplicate name the column keeps its old name.
    pub fn rename(&mut self, ordinal: usize, name: &str) -> TableResult<()> {
        let old = self.column(ordinal)?.name().to_string();
        if old == name {
            return Ok(());
        }
        if name.is_empty() {
            return Err(TableError::invalid_column(old, "column name cannot be empty"));
        }
        if self.by_name.contains_key(name) {
            return Err(TableError::DuplicateColumn {
                name: name.to_string(),
            });
        }

        self.unregister(&old);
        self.register(name, ordinal);
        if let Some(column) = self.columns.get_mut(ordinal) {
            column.set_name(name.to_string());
        }
        Ok(())
    }

    /// Rebuilds the auto-increment side list after a flag change.
    pub(crate) fn refresh_auto_increment(&mut self) {
        self.auto_increment = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_auto_increment())
            .map(|(i, _)| i)
            .collect();
    }

    fn register(&mut self, name: &str, ordinal: usize) {
        self.by_name.insert(name.to_string(), ordinal);
        self.groups.register(name);
    }

    fn unregister(&mut self, name: &str) {
        self.by_name.remove(name);
        self.groups.unregister(name);

        // A freed default name below the cursor becomes available again
        if let Some(index) = name
            .strip_prefix(DEFAULT_COLUMN_PREFIX)
            .and_then(|suffix| suffix.parse::<usize>().ok())
        {
            if index >= FIRST_DEFAULT_COLUMN_INDEX && index < self.default_name_cursor {
                self.default_name_cursor = index;
            }
        }
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        for (ordinal, column) in self.columns.iter_mut().enumerate() {
            column.set_ordinal(Some(ordinal));
            self.by_name.insert(column.name().to_string(), ordinal);
        }
        self.refresh_auto_increment();
    }
}

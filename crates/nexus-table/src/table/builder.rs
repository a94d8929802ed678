//! Table construction.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use nexus_common::config::TableConfig;
use nexus_common::error::TableResult;
use nexus_common::types::RowHandle;

use super::Table;
use crate::column::Column;
use crate::events::{SharedListener, TableListener};

/// Closure run by [`Table::new_row`] on every fresh row, after defaults and
/// generated values are in place.
pub type RowInitializer = Box<dyn FnMut(&mut Table, RowHandle) -> TableResult<()>>;

/// Builder for a [`Table`] with its schema, listeners and row initializer.
///
/// # Example
///
/// ```rust
/// use nexus_table::{Column, DataType, Table, Value};
///
/// let mut table = Table::builder("orders")
///     .with_column(Column::not_null("id", DataType::BigInt).with_auto_increment(1, 1))
///     .with_column(Column::new("status", DataType::Text))
///     .with_row_initializer(|table, row| table.set_value(row, "status", "open"))
///     .build()
///     .unwrap();
///
/// let row = table.new_row().unwrap();
/// assert_eq!(table.get(row, "status").unwrap(), Value::string("open"));
/// ```
pub struct TableBuilder {
    name: String,
    config: TableConfig,
    columns: Vec<Column>,
    listeners: Vec<SharedListener>,
    row_initializer: Option<RowInitializer>,
}

impl TableBuilder {
    /// Starts a builder for a table called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: TableConfig::default(),
            columns: Vec::new(),
            listeners: Vec::new(),
            row_initializer: None,
        }
    }

    /// Sets the table configuration.
    #[must_use]
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends several columns.
    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Registers a listener.
    #[must_use]
    pub fn with_listener<L: TableListener + 'static>(mut self, listener: Rc<RefCell<L>>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Sets the closure that initializes every new row.
    #[must_use]
    pub fn with_row_initializer<F>(mut self, initializer: F) -> Self
    where
        F: FnMut(&mut Table, RowHandle) -> TableResult<()> + 'static,
    {
        self.row_initializer = Some(Box::new(initializer));
        self
    }

    /// Builds the table, adding the columns in order.
    pub fn build(self) -> TableResult<Table> {
        let mut table = Table::with_config(self.name, self.config)?;
        for column in self.columns {
            table.add_column(column)?;
        }
        for listener in self.listeners {
            table.add_shared_listener(listener);
        }
        table.row_initializer = self.row_initializer;
        Ok(table)
    }
}

impl fmt::Debug for TableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBuilder")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("columns", &self.columns.len())
            .field("listeners", &self.listeners.len())
            .field("row_initializer", &self.row_initializer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use nexus_common::error::TableError;

    use super::*;
    use crate::value::{DataType, Value};

    #[derive(Default)]
    struct Counter {
        new_rows: usize,
    }

    impl TableListener for Counter {
        fn table_new_row(&mut self, _table: &mut Table, _row: RowHandle) {
            self.new_rows += 1;
        }
    }

    #[test]
    fn test_build_table() {
        let counter = Rc::new(RefCell::new(Counter::default()));
        let mut table = TableBuilder::new("t")
            .with_config(TableConfig::for_testing())
            .with_columns([
                Column::new("a", DataType::Int),
                Column::unnamed(DataType::Text),
            ])
            .with_listener(Rc::clone(&counter))
            .build()
            .unwrap();

        assert_eq!(table.name(), "t");
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.column(1usize).unwrap().name(), "Column1");

        table.new_row().unwrap();
        assert_eq!(counter.borrow().new_rows, 1);
    }

    #[test]
    fn test_build_rejects_duplicate_columns() {
        let err = TableBuilder::new("t")
            .with_column(Column::new("a", DataType::Int))
            .with_column(Column::new("a", DataType::Text))
            .build()
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_row_initializer_runs_after_defaults() {
        let mut table = TableBuilder::new("t")
            .with_config(TableConfig::for_testing())
            .with_column(Column::new("id", DataType::Int).with_auto_increment(1, 1))
            .with_column(Column::new("label", DataType::Text))
            .with_row_initializer(|table, row| {
                let id = table.get(row, "id")?;
                table.set_value(row, "label", format!("row {}", id))
            })
            .build()
            .unwrap();

        let row = table.new_row().unwrap();
        assert_eq!(table.get(row, "label").unwrap(), Value::string("row 1"));
    }

    #[test]
    fn test_row_initializer_failure_discards_row() {
        let mut table = TableBuilder::new("t")
            .with_config(TableConfig::for_testing())
            .with_column(Column::new("a", DataType::Int))
            .with_row_initializer(|_, _| Err(TableError::constraint("no rows today")))
            .build()
            .unwrap();

        assert!(table.new_row().is_err());
        assert_eq!(table.rows().record_count(), 0);
        assert_eq!(table.arena().populated_count(), 0);
    }
}

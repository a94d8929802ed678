//! Fixtures and assertions shared by the integration tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Once;

use nexus_common::error::TableResult;
use nexus_common::types::{RowHandle, SlotId};
use nexus_common::TableConfig;
use nexus_table::{Column, ColumnChange, DataType, RowAction, Table, TableListener};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `people(id int unique not null, name text)` with a tiny arena so tests
/// exercise growth.
pub fn people_table() -> Table {
    Table::builder("people")
        .with_config(TableConfig::for_testing())
        .with_column(Column::not_null("id", DataType::Int).with_unique(true))
        .with_column(Column::new("name", DataType::Text))
        .build()
        .expect("people table")
}

/// `orders(order_id bigint auto-increment, person_id int not null, item text)`.
pub fn orders_table() -> Table {
    Table::builder("orders")
        .with_config(TableConfig::for_testing())
        .with_column(Column::not_null("order_id", DataType::BigInt).with_auto_increment(1, 1))
        .with_column(Column::not_null("person_id", DataType::Int))
        .with_column(Column::new("item", DataType::Text))
        .build()
        .expect("orders table")
}

/// Every slot referenced by any row of `table`, detached rows included.
pub fn referenced_slots(table: &Table) -> HashSet<SlotId> {
    table.rows().all_rows().flat_map(|row| row.slots()).collect()
}

/// Asserts that the arena's live slots are exactly the default slot plus
/// the slots rows reference.
pub fn assert_slot_accounting(table: &Table) {
    let referenced = referenced_slots(table);
    assert_eq!(
        table.arena().populated_count(),
        referenced.len(),
        "live slots must match referenced slots in {:?}",
        table
    );
    for slot in &referenced {
        assert!(table.arena().is_live(*slot), "row references freed slot {}", slot);
    }
}

/// Listener that records every notification as a line of text.
#[derive(Debug, Default)]
pub struct Recorder {
    /// Recorded notifications, oldest first.
    pub events: Vec<String>,
    tag: String,
}

impl Recorder {
    /// Creates a shared recorder whose lines start with `tag`.
    pub fn shared(tag: &str) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            events: Vec::new(),
            tag: tag.to_string(),
        }))
    }

    fn push(&mut self, event: String) {
        self.events.push(format!("{}:{}", self.tag, event));
    }
}

impl TableListener for Recorder {
    fn column_changing(&mut self, _table: &mut Table, change: &ColumnChange) -> TableResult<()> {
        self.push(format!("column_changing {}", change.column));
        Ok(())
    }

    fn column_changed(&mut self, _table: &mut Table, change: &ColumnChange) {
        self.push(format!("column_changed {}", change.column));
    }

    fn row_changing(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        self.push(format!("row_changing {}", action));
        Ok(())
    }

    fn row_changed(&mut self, _table: &mut Table, _row: RowHandle, action: RowAction) {
        self.push(format!("row_changed {}", action));
    }

    fn row_deleting(&mut self, _table: &mut Table, _row: RowHandle) -> TableResult<()> {
        self.push("row_deleting".to_string());
        Ok(())
    }

    fn row_deleted(&mut self, _table: &mut Table, _row: RowHandle) {
        self.push("row_deleted".to_string());
    }

    fn child_check(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        self.push(format!("child_check {}", action));
        Ok(())
    }

    fn table_new_row(&mut self, _table: &mut Table, _row: RowHandle) {
        self.push("table_new_row".to_string());
    }

    fn table_clearing(&mut self, _table: &mut Table) {
        self.push("table_clearing".to_string());
    }

    fn table_cleared(&mut self, _table: &mut Table) {
        self.push("table_cleared".to_string());
    }
}

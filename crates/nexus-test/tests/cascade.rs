//! Listeners: notification order, vetoes, cross-table cascades and
//! reentrancy.

use std::cell::RefCell;
use std::rc::Rc;

use nexus_common::error::{TableError, TableResult};
use nexus_common::types::{RowHandle, RowState, RowVersion};
use nexus_table::{Column, ColumnChange, DataType, RowAction, Table, TableListener, Value};
use nexus_test::utils::{assert_slot_accounting, init_tracing, orders_table, people_table, Recorder};

/// Enforces the unique flag on `people.id`.
struct UniqueId;

impl UniqueId {
    fn check(table: &Table, row: RowHandle, id: &Value) -> TableResult<()> {
        let taken = table
            .rows()
            .handles()
            .iter()
            .filter(|other| **other != row)
            .any(|other| table.get(*other, "id").is_ok_and(|v| v == *id));
        if taken {
            return Err(TableError::UniquenessViolation {
                column: "id".to_string(),
                value: id.to_string(),
            });
        }
        Ok(())
    }
}

impl TableListener for UniqueId {
    fn column_changing(&mut self, table: &mut Table, change: &ColumnChange) -> TableResult<()> {
        if change.column == "id" {
            Self::check(table, change.row, &change.proposed)?;
        }
        Ok(())
    }

    fn row_changing(
        &mut self,
        table: &mut Table,
        row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        if action == RowAction::Add {
            let id = table.get(row, "id")?;
            Self::check(table, row, &id)?;
        }
        Ok(())
    }
}

/// Cascades deletes and key updates from `people` to `orders`.
struct PeopleToOrders {
    orders: Rc<RefCell<Table>>,
}

impl PeopleToOrders {
    fn children(orders: &Table, id: &Value) -> Vec<RowHandle> {
        orders
            .rows()
            .handles()
            .iter()
            .copied()
            .filter(|h| orders.get(*h, "person_id").is_ok_and(|v| v == *id))
            .collect()
    }
}

impl TableListener for PeopleToOrders {
    fn child_check(
        &mut self,
        table: &mut Table,
        row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        if !table.has_version(row, RowVersion::Current)? {
            return Ok(());
        }
        let mut orders = self.orders.borrow_mut();
        match action {
            RowAction::Delete => {
                let id = table.value(row, "id", RowVersion::Current)?;
                for child in Self::children(&orders, &id) {
                    orders.delete(child)?;
                }
            }
            RowAction::Change => {
                let old = table.value(row, "id", RowVersion::Current)?;
                let new = table.value(row, "id", RowVersion::Proposed)?;
                if old != new {
                    for child in Self::children(&orders, &old) {
                        orders.set_value(child, "person_id", new.clone())?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Rejects every delete.
struct Frozen;

impl TableListener for Frozen {
    fn row_deleting(&mut self, _table: &mut Table, _row: RowHandle) -> TableResult<()> {
        Err(TableError::constraint("orders are frozen"))
    }
}

struct Fixture {
    people: Table,
    orders: Rc<RefCell<Table>>,
    ada: RowHandle,
    bob: RowHandle,
}

fn fixture() -> Fixture {
    init_tracing();
    let mut people = people_table();
    let orders = Rc::new(RefCell::new(orders_table()));
    people.add_listener(Rc::new(RefCell::new(UniqueId)));
    people.add_listener(Rc::new(RefCell::new(PeopleToOrders {
        orders: Rc::clone(&orders),
    })));

    let ada = people.load_row(&[Value::int(1), Value::string("ada")], true).unwrap();
    let bob = people.load_row(&[Value::int(2), Value::string("bob")], true).unwrap();
    {
        let mut o = orders.borrow_mut();
        for (person, item) in [(1, "pen"), (1, "ink"), (2, "cup")] {
            o.load_row(&[Value::Null, Value::int(person), Value::string(item)], true)
                .unwrap();
        }
    }
    Fixture {
        people,
        orders,
        ada,
        bob,
    }
}

fn order_states(orders: &Table) -> Vec<RowState> {
    orders
        .rows()
        .handles()
        .iter()
        .map(|h| orders.row_state(*h).unwrap())
        .collect()
}

#[test]
fn test_delete_cascades_to_children() {
    let mut f = fixture();
    f.people.delete(f.ada).unwrap();

    assert_eq!(f.people.row_state(f.ada).unwrap(), RowState::Deleted);
    assert_eq!(
        order_states(&f.orders.borrow()),
        vec![RowState::Deleted, RowState::Deleted, RowState::Unchanged]
    );

    f.people.accept_all_changes().unwrap();
    f.orders.borrow_mut().accept_all_changes().unwrap();
    assert_eq!(f.people.len(), 1);
    assert_eq!(f.orders.borrow().len(), 1);
    assert_slot_accounting(&f.people);
    assert_slot_accounting(&f.orders.borrow());
}

#[test]
fn test_key_update_cascades_to_children() {
    let mut f = fixture();
    f.people.set_value(f.ada, "id", 10).unwrap();

    let orders = f.orders.borrow();
    let ids: Vec<Value> = orders
        .rows()
        .handles()
        .iter()
        .map(|h| orders.get(*h, "person_id").unwrap())
        .collect();
    assert_eq!(ids, vec![Value::int(10), Value::int(10), Value::int(2)]);
    assert_eq!(
        order_states(&orders),
        vec![RowState::Modified, RowState::Modified, RowState::Unchanged]
    );
}

#[test]
fn test_child_veto_rejects_parent_delete() {
    let mut f = fixture();
    f.orders
        .borrow_mut()
        .add_listener(Rc::new(RefCell::new(Frozen)));

    let err = f.people.delete(f.ada).unwrap_err();
    assert_eq!(err, TableError::constraint("orders are frozen"));
    assert_eq!(f.people.row_state(f.ada).unwrap(), RowState::Unchanged);
    assert_eq!(f.people.get(f.ada, "name").unwrap(), Value::string("ada"));
    assert_eq!(
        order_states(&f.orders.borrow()),
        vec![RowState::Unchanged; 3]
    );
    assert_slot_accounting(&f.people);
}

#[test]
fn test_uniqueness_veto() {
    let mut f = fixture();

    let err = f.people.set_value(f.bob, "id", 1).unwrap_err();
    assert!(matches!(err, TableError::UniquenessViolation { .. }));
    assert_eq!(f.people.get(f.bob, "id").unwrap(), Value::int(2));
    assert_eq!(f.people.row_state(f.bob).unwrap(), RowState::Unchanged);

    let err = f.people.add_row_values(&[Value::int(2)]).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(f.people.len(), 2);
    assert_slot_accounting(&f.people);

    let row = f.people.new_row().unwrap();
    f.people.set_value(row, "id", 2).unwrap_err();
    f.people.set_value(row, "id", 3).unwrap();
    f.people.add_row(row).unwrap();
    assert_eq!(f.people.len(), 3);
}

/// Rejects row commits through `child_check`.
struct RejectChange;

impl TableListener for RejectChange {
    fn child_check(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        match action {
            RowAction::Change => Err(TableError::constraint("no changes")),
            _ => Ok(()),
        }
    }
}

#[test]
fn test_rejected_end_edit_keeps_row() {
    init_tracing();
    let mut table = people_table();
    let row = table.load_row(&[Value::int(1), Value::string("a")], true).unwrap();
    table.add_listener(Rc::new(RefCell::new(RejectChange)));

    table.begin_edit(row).unwrap();
    table.set_value(row, "name", "b").unwrap();
    let current = table.row(row).unwrap().current();

    assert!(table.end_edit(row).is_err());
    assert_eq!(table.row_state(row).unwrap(), RowState::Unchanged);
    assert_eq!(table.row(row).unwrap().current(), current);
    assert_eq!(
        table.value(row, "name", RowVersion::Current).unwrap(),
        Value::string("a")
    );
    assert!(table.row(row).unwrap().is_editing());

    table.cancel_edit(row).unwrap();
    assert_slot_accounting(&table);

    // The implicit edit rolls back on its own
    assert!(table.set_value(row, "name", "c").is_err());
    assert!(!table.row(row).unwrap().is_editing());
    assert_slot_accounting(&table);
}

/// Rejects every commit.
struct RejectCommit;

impl TableListener for RejectCommit {
    fn row_changing(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        match action {
            RowAction::Commit => Err(TableError::constraint("no commit")),
            _ => Ok(()),
        }
    }
}

#[test]
fn test_rejected_accept_reopens_edit() {
    init_tracing();
    let mut table = people_table();
    let row = table.load_row(&[Value::int(1), Value::string("a")], true).unwrap();
    let veto = table.add_listener(Rc::new(RefCell::new(RejectCommit)));

    table.begin_edit(row).unwrap();
    table.set_value(row, "name", "b").unwrap();
    let before = table.row(row).unwrap().slots().collect::<Vec<_>>();
    let proposed = table.row(row).unwrap().proposed();

    let err = table.accept_changes(row).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(table.row_state(row).unwrap(), RowState::Unchanged);
    assert!(table.row(row).unwrap().is_editing());
    assert_eq!(table.row(row).unwrap().proposed(), proposed);
    assert_eq!(table.row(row).unwrap().slots().collect::<Vec<_>>(), before);
    assert_eq!(
        table.value(row, "name", RowVersion::Current).unwrap(),
        Value::string("a")
    );
    assert_eq!(
        table.value(row, "name", RowVersion::Proposed).unwrap(),
        Value::string("b")
    );
    assert_slot_accounting(&table);

    // A modified row without an open edit is left alone as well
    table.end_edit(row).unwrap();
    let current = table.row(row).unwrap().current();
    assert!(table.accept_changes(row).is_err());
    assert_eq!(table.row_state(row).unwrap(), RowState::Modified);
    assert_eq!(table.row(row).unwrap().current(), current);

    assert!(table.remove_listener(veto));
    table.accept_changes(row).unwrap();
    assert_eq!(table.row_state(row).unwrap(), RowState::Unchanged);
    assert_eq!(table.get(row, "name").unwrap(), Value::string("b"));
    assert_slot_accounting(&table);
}

/// Appends `tag:event` lines to a log shared between listeners.
struct Tagged {
    tag: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl TableListener for Tagged {
    fn row_changing(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        self.log
            .borrow_mut()
            .push(format!("{}:changing {}", self.tag, action));
        Ok(())
    }

    fn child_check(
        &mut self,
        _table: &mut Table,
        _row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        self.log
            .borrow_mut()
            .push(format!("{}:check {}", self.tag, action));
        Ok(())
    }
}

#[test]
fn test_listeners_run_in_registration_order() {
    init_tracing();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut table = people_table();
    table.add_listener(Rc::new(RefCell::new(Tagged {
        tag: "first",
        log: Rc::clone(&log),
    })));
    table.add_listener(Rc::new(RefCell::new(Tagged {
        tag: "second",
        log: Rc::clone(&log),
    })));

    let row = table.load_row(&[Value::int(1)], true).unwrap();
    log.borrow_mut().clear();
    table.set_value(row, "name", "x").unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "first:changing Change",
            "second:changing Change",
            "first:check Change",
            "second:check Change",
        ]
    );
}

#[test]
fn test_notification_sequence() {
    init_tracing();
    let recorder = Recorder::shared("p");
    let mut table = people_table();
    let id = table.add_listener(Rc::clone(&recorder));

    let row = table.new_row().unwrap();
    table.set_value(row, "id", 1).unwrap();
    table.add_row(row).unwrap();
    table.accept_changes(row).unwrap();
    table.set_value(row, "name", "b").unwrap();
    table.delete(row).unwrap();
    table.accept_changes(row).unwrap();
    table.clear().unwrap();

    assert_eq!(
        recorder.borrow().events,
        vec![
            "p:table_new_row",
            "p:column_changing id",
            "p:column_changed id",
            "p:row_changing Add",
            "p:row_changed Add",
            "p:row_changing Commit",
            "p:child_check Commit",
            "p:row_changed Commit",
            "p:column_changing name",
            "p:column_changed name",
            "p:row_changing Change",
            "p:child_check Change",
            "p:row_changed Change",
            "p:row_deleting",
            "p:child_check Delete",
            "p:row_deleted",
            "p:row_changing Commit",
            "p:child_check Commit",
            "p:row_changed Commit",
            "p:table_clearing",
            "p:table_cleared",
        ]
    );

    assert!(table.remove_listener(id));
    table.load_row(&[Value::int(2)], true).unwrap();
    assert_eq!(recorder.borrow().events.len(), 21);
}

/// Tries to edit the row being committed from inside its own callback.
struct Reenter;

impl TableListener for Reenter {
    fn row_changing(
        &mut self,
        table: &mut Table,
        row: RowHandle,
        action: RowAction,
    ) -> TableResult<()> {
        if action == RowAction::Change {
            table.begin_edit(row)?;
        }
        Ok(())
    }
}

#[test]
fn test_reentrant_edit_is_rejected() {
    init_tracing();
    let mut table = people_table();
    let row = table.load_row(&[Value::int(1), Value::string("a")], true).unwrap();
    let listener = table.add_listener(Rc::new(RefCell::new(Reenter)));

    let err = table.set_value(row, "name", "b").unwrap_err();
    assert_eq!(
        err,
        TableError::ReentrantEdit {
            operation: "begin_edit"
        }
    );
    assert_eq!(table.get(row, "name").unwrap(), Value::string("a"));
    assert!(!table.row(row).unwrap().edit_flag().is_held());
    assert_slot_accounting(&table);

    table.remove_listener(listener);
    table.set_value(row, "name", "b").unwrap();
    assert_eq!(table.row_state(row).unwrap(), RowState::Modified);
}

/// Counts committed changes into a dedicated row of the same table.
struct Audit {
    counter_row: RowHandle,
}

impl TableListener for Audit {
    fn row_changed(&mut self, table: &mut Table, row: RowHandle, action: RowAction) {
        if action != RowAction::Change || row == self.counter_row {
            return;
        }
        let count = table
            .get(self.counter_row, "id")
            .ok()
            .and_then(|v| v.to_i64())
            .unwrap_or(0);
        let _ = table.set_value(self.counter_row, "id", Value::bigint(count + 1));
    }
}

#[test]
fn test_listener_edits_other_row() {
    init_tracing();
    let mut table = people_table();
    let counter_row = table.load_row(&[Value::int(0), Value::string("counter")], true).unwrap();
    let row = table.load_row(&[Value::int(100)], true).unwrap();
    table.add_listener(Rc::new(RefCell::new(Audit { counter_row })));

    table.set_value(row, "name", "a").unwrap();
    table.set_value(row, "name", "b").unwrap();

    assert_eq!(table.get(counter_row, "id").unwrap(), Value::int(2));
    assert_eq!(table.row_state(counter_row).unwrap(), RowState::Modified);
    assert_slot_accounting(&table);
}

/// Attempts schema changes from inside a notification.
#[derive(Default)]
struct SchemaMeddler {
    results: Vec<TableResult<()>>,
}

impl TableListener for SchemaMeddler {
    fn row_changed(&mut self, table: &mut Table, _row: RowHandle, _action: RowAction) {
        self.results.push(
            table
                .add_column(Column::new("late", DataType::Text))
                .map(|_| ()),
        );
        self.results.push(table.clear());
    }
}

#[test]
fn test_schema_locked_during_notification() {
    init_tracing();
    let meddler = Rc::new(RefCell::new(SchemaMeddler::default()));
    let mut table = people_table();
    table.add_listener(Rc::clone(&meddler));

    let row = table.add_row_values(&[Value::int(1)]).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.columns().len(), 2);
    assert_eq!(
        meddler.borrow().results,
        vec![
            Err(TableError::SchemaLocked {
                operation: "add a column"
            }),
            Err(TableError::SchemaLocked {
                operation: "clear the table"
            }),
        ]
    );
    assert_eq!(table.row_state(row).unwrap(), RowState::Added);
    assert!(!table.is_notifying());
}

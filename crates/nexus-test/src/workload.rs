//! Random operation sequences over a `people` table.
//!
//! Every operation is allowed to fail; the tests check that the table's
//! invariants hold after each step regardless.

use nexus_common::error::TableResult;
use nexus_common::types::RowHandle;
use nexus_table::{Table, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// One step of a workload. Row operands index into the handles created so
/// far, modulo their count.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `new_row`
    NewRow,
    /// `add_row` on a previously created row.
    AddRow(usize),
    /// `add_row_values` with an optional id.
    AddValues(Option<i32>),
    /// `load_row` accepted.
    Load(i32),
    /// `set_value` on `id` (`None` writes null).
    SetId(usize, Option<i32>),
    /// `set_value` on `name`.
    SetName(usize, String),
    /// `begin_edit`
    BeginEdit(usize),
    /// `end_edit`
    EndEdit(usize),
    /// `cancel_edit`
    CancelEdit(usize),
    /// `delete`
    Delete(usize),
    /// `accept_changes`
    Accept(usize),
    /// `reject_changes`
    Reject(usize),
    /// `remove_row`
    Remove(usize),
    /// `accept_all_changes`
    AcceptAll,
    /// `reject_all_changes`
    RejectAll,
}

/// Seeded generator of [`Op`] sequences.
#[derive(Debug)]
pub struct Workload {
    rng: StdRng,
}

impl Workload {
    /// Creates a generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates `count` operations.
    pub fn generate(&mut self, count: usize) -> Vec<Op> {
        (0..count).map(|_| self.next_op()).collect()
    }

    fn next_op(&mut self) -> Op {
        let row = self.rng.gen_range(0..64);
        match self.rng.gen_range(0..15) {
            0 => Op::NewRow,
            1 => Op::AddRow(row),
            2 => Op::AddValues(self.rng.gen_bool(0.9).then(|| self.rng.gen_range(0..100))),
            3 => Op::Load(self.rng.gen_range(0..100)),
            4 => Op::SetId(row, self.rng.gen_bool(0.9).then(|| self.rng.gen_range(0..100))),
            5 => Op::SetName(row, format!("n{}", self.rng.gen_range(0..10))),
            6 => Op::BeginEdit(row),
            7 => Op::EndEdit(row),
            8 => Op::CancelEdit(row),
            9 => Op::Delete(row),
            10 => Op::Accept(row),
            11 => Op::Reject(row),
            12 => Op::Remove(row),
            13 => Op::AcceptAll,
            _ => Op::RejectAll,
        }
    }
}

/// Applies `op` to `table`, recording created rows in `handles`.
pub fn apply(table: &mut Table, handles: &mut Vec<RowHandle>, op: &Op) -> TableResult<()> {
    trace!(?op, "applying");

    match op {
        Op::NewRow => handles.push(table.new_row()?),
        Op::AddValues(id) => {
            let id = id.map_or(Value::Null, Value::int);
            handles.push(table.add_row_values(&[id, Value::string("v")])?);
        }
        Op::Load(id) => handles.push(table.load_row(&[Value::int(*id)], true)?),
        Op::AcceptAll => table.accept_all_changes()?,
        Op::RejectAll => table.reject_all_changes()?,
        Op::AddRow(i)
        | Op::SetId(i, _)
        | Op::SetName(i, _)
        | Op::BeginEdit(i)
        | Op::EndEdit(i)
        | Op::CancelEdit(i)
        | Op::Delete(i)
        | Op::Accept(i)
        | Op::Reject(i)
        | Op::Remove(i) => {
            let Some(row) = handles.get(*i % handles.len().max(1)).copied() else {
                return Ok(());
            };
            match op {
                Op::AddRow(_) => table.add_row(row)?,
                Op::SetId(_, id) => table.set_value(row, "id", id.map_or(Value::Null, Value::int))?,
                Op::SetName(_, name) => table.set_value(row, "name", name.as_str())?,
                Op::BeginEdit(_) => table.begin_edit(row)?,
                Op::EndEdit(_) => table.end_edit(row)?,
                Op::CancelEdit(_) => table.cancel_edit(row)?,
                Op::Delete(_) => table.delete(row)?,
                Op::Accept(_) => table.accept_changes(row)?,
                Op::Reject(_) => table.reject_changes(row)?,
                Op::Remove(_) => table.remove_row(row)?,
                _ => {}
            }
        }
    }
    Ok(())
}

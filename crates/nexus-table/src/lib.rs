//! # nexus-table
//!
//! In-memory multi-version row store for NexusDB.
//!
//! A [`Table`] keeps its data column-wise: one [`ColumnStorage`] per column,
//! all indexed by the same slot ids handed out by a [`SlotArena`]. A row is
//! an identity that references up to three slots (original, current and
//! proposed) and derives its state from them:
//! - Edits write into a proposed version and commit or roll back as a unit
//! - `accept_changes` / `reject_changes` settle the original version
//! - Collaborators observe and veto transitions through [`TableListener`]
//!
//! ## Example
//!
//! ```rust
//! use nexus_common::types::{RowState, RowVersion};
//! use nexus_table::{Column, DataType, Table, Value};
//!
//! let mut table = Table::builder("people")
//!     .with_column(Column::not_null("id", DataType::Int))
//!     .with_column(Column::new("name", DataType::Text))
//!     .build()
//!     .unwrap();
//!
//! let row = table.load_row(&[Value::int(1), Value::string("ada")], true).unwrap();
//! table.set_value(row, "name", "grace").unwrap();
//!
//! assert_eq!(table.row_state(row).unwrap(), RowState::Modified);
//! assert_eq!(
//!     table.value(row, "name", RowVersion::Original).unwrap(),
//!     Value::string("ada")
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Slot allocation
pub mod arena;

/// Attached and detached rows of a table
pub mod collection;

/// Column definitions and the column set
pub mod column;

/// Notifications and listeners
pub mod events;

/// Row identity and version slots
pub mod row;

/// Typed column storage
pub mod storage;

/// The table and its operations
pub mod table;

/// Values and data types
pub mod value;

pub use arena::{Allocation, SlotArena};
pub use collection::RowCollection;
pub use column::{AutoIncrement, Column, ColumnSet};
pub use events::{ColumnChange, RowAction, SharedListener, TableListener};
pub use row::{EditFlag, EditGuard, Row};
pub use storage::{ColumnStorage, NullBitmap};
pub use table::{ColumnKey, RowInitializer, RowMut, RowRef, Table, TableBuilder};
pub use value::{CastError, DataType, Value};

pub use nexus_common::{
    RowHandle, RowId, RowState, RowStates, RowVersion, SlotId, TableConfig, TableError,
    TableResult,
};

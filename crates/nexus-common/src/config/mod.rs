//! Configuration for the row store.
//!
//! This module provides configuration structures for tables.

mod table;

pub use table::TableConfig;

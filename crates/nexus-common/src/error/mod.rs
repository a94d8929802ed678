//! Error handling for the row store.
//!
//! This module provides a unified error type and result alias used
//! across all row store components.

mod table;

pub use table::{ErrorCode, TableError};

/// Result type alias for row store operations.
pub type TableResult<T> = std::result::Result<T, TableError>;

//! Table error types.
//!
//! Provides the error taxonomy for every row store operation.

use std::fmt;
use thiserror::Error;

use crate::types::{RowHandle, RowVersion};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid configuration.
    InvalidConfig = 0x0002,
    /// Value could not be coerced to the column type.
    TypeMismatch = 0x0003,

    // Row errors (0x0100 - 0x01FF)
    /// Row is not part of the table.
    RowNotInTable = 0x0100,
    /// Deleted row data requested through the current/default version.
    DeletedRowInaccessible = 0x0101,
    /// Requested version does not exist for the row.
    VersionNotFound = 0x0102,
    /// Edit operation issued from inside the row's own notification.
    ReentrantEdit = 0x0103,
    /// Row handle does not belong to the table.
    UnknownRow = 0x0104,
    /// Row is already attached to the table.
    RowAlreadyAttached = 0x0105,

    // Constraint errors (0x0200 - 0x02FF)
    /// Write to a read-only column.
    ReadOnlyViolation = 0x0200,
    /// Null in a column that disallows nulls.
    NullConstraintViolation = 0x0201,
    /// Duplicate value in a unique column.
    UniquenessViolation = 0x0202,
    /// Other constraint or relation veto.
    ConstraintViolation = 0x0203,
    /// Text longer than the column's maximum length.
    MaxLengthExceeded = 0x0204,

    // Schema errors (0x0300 - 0x03FF)
    /// Column ordinal out of range.
    OrdinalOutOfRange = 0x0300,
    /// Column name already used.
    DuplicateColumn = 0x0301,
    /// Case-insensitive lookup matched several columns.
    AmbiguousColumn = 0x0302,
    /// Column not found.
    ColumnNotFound = 0x0303,
    /// Column already holds data.
    ColumnPopulated = 0x0304,
    /// Column definition is invalid.
    InvalidColumn = 0x0305,
    /// Schema cannot change while notifications are dispatched.
    SchemaLocked = 0x0306,
    /// More values than columns.
    TooManyValues = 0x0307,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Row",
            0x02 => "Constraint",
            0x03 => "Schema",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for the row store.
///
/// Every mutating operation returns these synchronously to its direct
/// caller. Errors raised by listeners pass through unchanged.
///
/// # Example
///
/// ```rust
/// use nexus_common::error::{ErrorCode, TableError};
///
/// let err = TableError::NullConstraintViolation { column: "id".into() };
/// assert_eq!(err.code(), ErrorCode::NullConstraintViolation);
/// assert_eq!(err.to_string(), "column 'id' does not allow nulls");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Value could not be coerced to the column type.
    #[error("cannot store {actual} in column '{column}': expected {expected}")]
    TypeMismatch {
        /// The column written to.
        column: String,
        /// Expected type.
        expected: String,
        /// Description of the offending value.
        actual: String,
    },

    // ==========================================================================
    // Row Errors
    // ==========================================================================
    /// Row has no data in this table.
    #[error("row is not in the table and has no data")]
    RowNotInTable,

    /// Deleted row information cannot be accessed through the row.
    #[error("deleted row information cannot be accessed through the row")]
    DeletedRowInaccessible,

    /// The requested version does not exist.
    #[error("there is no {version} data to access")]
    VersionNotFound {
        /// The missing version.
        version: RowVersion,
    },

    /// Edit issued from inside the row's own notification.
    #[error("cannot call {operation} inside the row's changing notification")]
    ReentrantEdit {
        /// The rejected operation.
        operation: &'static str,
    },

    /// Row handle is not known to the table.
    #[error("row {handle} does not belong to this table")]
    UnknownRow {
        /// The unknown handle.
        handle: RowHandle,
    },

    /// Row already belongs to the row collection.
    #[error("row {handle} already belongs to this table")]
    RowAlreadyAttached {
        /// The attached handle.
        handle: RowHandle,
    },

    // ==========================================================================
    // Constraint Errors
    // ==========================================================================
    /// Write to a read-only column.
    #[error("column '{column}' is read only")]
    ReadOnlyViolation {
        /// The read-only column.
        column: String,
    },

    /// Null in a non-nullable column.
    #[error("column '{column}' does not allow nulls")]
    NullConstraintViolation {
        /// The non-nullable column.
        column: String,
    },

    /// Duplicate value in a unique column.
    #[error("column '{column}' is constrained to be unique, value '{value}' is already present")]
    UniquenessViolation {
        /// The unique column.
        column: String,
        /// The duplicated value.
        value: String,
    },

    /// Other constraint or relation veto.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Error message.
        message: String,
    },

    /// Text longer than the column allows.
    #[error("value of length {length} exceeds max length {max_length} of column '{column}'")]
    MaxLengthExceeded {
        /// The column written to.
        column: String,
        /// Length of the value.
        length: usize,
        /// Column maximum.
        max_length: usize,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// Column ordinal out of range.
    #[error("ordinal {ordinal} is out of range for {count} columns")]
    OrdinalOutOfRange {
        /// The requested ordinal.
        ordinal: usize,
        /// Number of columns.
        count: usize,
    },

    /// Column name already used.
    #[error("a column named '{name}' already belongs to this table")]
    DuplicateColumn {
        /// The duplicated name.
        name: String,
    },

    /// Case-insensitive lookup matched several columns.
    #[error("there is no match for '{name}' in the same case and there are multiple matches in different case")]
    AmbiguousColumn {
        /// The ambiguous name.
        name: String,
    },

    /// Column not found.
    #[error("column '{name}' does not belong to table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        name: String,
        /// The table name.
        table: String,
    },

    /// Column already stores data.
    #[error("column '{column}' already has data stored")]
    ColumnPopulated {
        /// The populated column.
        column: String,
    },

    /// Column definition is invalid.
    #[error("invalid column '{column}': {reason}")]
    InvalidColumn {
        /// The column.
        column: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Schema change attempted while notifications are dispatched.
    #[error("cannot {operation} while table notifications are in progress")]
    SchemaLocked {
        /// The rejected operation.
        operation: &'static str,
    },

    /// More values supplied than the table has columns.
    #[error("input array of {given} values is longer than the {columns} columns in this table")]
    TooManyValues {
        /// Number of values supplied.
        given: usize,
        /// Number of columns.
        columns: usize,
    },
}

impl TableError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::RowNotInTable => ErrorCode::RowNotInTable,
            Self::DeletedRowInaccessible => ErrorCode::DeletedRowInaccessible,
            Self::VersionNotFound { .. } => ErrorCode::VersionNotFound,
            Self::ReentrantEdit { .. } => ErrorCode::ReentrantEdit,
            Self::UnknownRow { .. } => ErrorCode::UnknownRow,
            Self::RowAlreadyAttached { .. } => ErrorCode::RowAlreadyAttached,
            Self::ReadOnlyViolation { .. } => ErrorCode::ReadOnlyViolation,
            Self::NullConstraintViolation { .. } => ErrorCode::NullConstraintViolation,
            Self::UniquenessViolation { .. } => ErrorCode::UniquenessViolation,
            Self::ConstraintViolation { .. } => ErrorCode::ConstraintViolation,
            Self::MaxLengthExceeded { .. } => ErrorCode::MaxLengthExceeded,
            Self::OrdinalOutOfRange { .. } => ErrorCode::OrdinalOutOfRange,
            Self::DuplicateColumn { .. } => ErrorCode::DuplicateColumn,
            Self::AmbiguousColumn { .. } => ErrorCode::AmbiguousColumn,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::ColumnPopulated { .. } => ErrorCode::ColumnPopulated,
            Self::InvalidColumn { .. } => ErrorCode::InvalidColumn,
            Self::SchemaLocked { .. } => ErrorCode::SchemaLocked,
            Self::TooManyValues { .. } => ErrorCode::TooManyValues,
        }
    }

    /// Returns true if this error is a constraint violation.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::ReadOnlyViolation { .. }
                | Self::NullConstraintViolation { .. }
                | Self::UniquenessViolation { .. }
                | Self::ConstraintViolation { .. }
                | Self::MaxLengthExceeded { .. }
        )
    }

    /// Returns true if this error is a schema violation.
    #[must_use]
    pub const fn is_schema_violation(&self) -> bool {
        (self.code() as u16) >> 8 == 0x03
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a generic constraint violation.
    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Creates an invalid column error.
    #[must_use]
    pub fn invalid_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

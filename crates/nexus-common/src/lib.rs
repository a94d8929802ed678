//! # nexus-common
//!
//! Common types, errors, and configuration for the NexusDB row store.
//!
//! This crate provides the foundational types shared by the table crate
//! and its collaborators. It includes:
//!
//! - **Types**: Identifiers (`SlotId`, `RowId`, `RowHandle`) and the row
//!   state/version vocabulary
//! - **Errors**: Unified error handling with `TableError`
//! - **Config**: Table configuration
//! - **Constants**: System-wide constants and limits
//!
//! ## Example
//!
//! ```rust
//! use nexus_common::types::{RowState, SlotId};
//! use nexus_common::error::TableResult;
//!
//! fn example() -> TableResult<()> {
//!     let slot = SlotId::new(3);
//!     assert_eq!(RowState::classify(Some(slot), Some(slot)), RowState::Unchanged);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::TableConfig;
pub use constants::*;
pub use error::{ErrorCode, TableError, TableResult};
pub use types::{ListenerId, RowHandle, RowId, RowState, RowStates, RowVersion, SlotId};

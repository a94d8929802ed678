//! Type definitions shared across the row store.
//!
//! This module contains the identifier newtypes and the row state/version
//! vocabulary.

mod ids;
mod row;

pub use ids::{ListenerId, RowHandle, RowId, SlotId};
pub use row::{RowState, RowStates, RowVersion};

//! System-wide constants for the row store.

// =============================================================================
// Slot Arena Constants
// =============================================================================

/// Default minimum number of slots allocated for a table.
///
/// Every table reserves one slot for its default values, so even an empty
/// table allocates this much column storage up front.
pub const DEFAULT_MINIMUM_CAPACITY: usize = 50;

/// Default multiplier applied to the slot capacity when the arena is full.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Largest slot id the arena will hand out.
pub const MAX_SLOT_ID: u32 = u32::MAX - 1;

// =============================================================================
// Schema Constants
// =============================================================================

/// Prefix of generated column names (`Column1`, `Column2`, ...).
pub const DEFAULT_COLUMN_PREFIX: &str = "Column";

/// First index used when generating a column name.
pub const FIRST_DEFAULT_COLUMN_INDEX: usize = 1;

/// Default auto-increment seed.
pub const DEFAULT_AUTO_INCREMENT_SEED: i64 = 0;

/// Default auto-increment step.
pub const DEFAULT_AUTO_INCREMENT_STEP: i64 = 1;

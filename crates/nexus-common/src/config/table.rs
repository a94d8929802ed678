//! Table configuration structures.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GROWTH_FACTOR, DEFAULT_MINIMUM_CAPACITY};
use crate::error::{TableError, TableResult};

/// Table configuration.
///
/// # Example
///
/// ```rust
/// use nexus_common::config::TableConfig;
///
/// let config = TableConfig::default();
/// assert_eq!(config.minimum_capacity, 50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of slots allocated when the table is created.
    /// Default: 50
    pub minimum_capacity: usize,

    /// Multiplier applied to the slot capacity when the arena runs out.
    /// Default: 2
    pub growth_factor: usize,

    /// Check the null rule when an edit is committed.
    /// Default: true
    pub enforce_constraints: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            minimum_capacity: DEFAULT_MINIMUM_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            enforce_constraints: true,
        }
    }
}

impl TableConfig {
    /// Creates a minimal configuration for testing.
    ///
    /// The tiny capacity makes the slot arena grow after a handful of rows.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            minimum_capacity: 2,
            ..Default::default()
        }
    }

    /// Sets the minimum capacity.
    #[must_use]
    pub fn with_minimum_capacity(mut self, capacity: usize) -> Self {
        self.minimum_capacity = capacity;
        self
    }

    /// Enables or disables constraint checks at commit.
    #[must_use]
    pub fn with_enforce_constraints(mut self, enforce: bool) -> Self {
        self.enforce_constraints = enforce;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> TableResult<()> {
        if self.minimum_capacity == 0 {
            return Err(TableError::InvalidConfig {
                message: "minimum_capacity must be at least 1".to_string(),
            });
        }

        if self.growth_factor < 2 {
            return Err(TableError::InvalidConfig {
                message: "growth_factor must be at least 2".to_string(),
            });
        }

        Ok(())
    }
}

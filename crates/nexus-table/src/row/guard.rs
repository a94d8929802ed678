//! Scoped edit guard.
//!
//! While a row's changing, deleting or child-check notification runs, the
//! row holds an [`EditGuard`]. Any attempt to begin, end or cancel an edit
//! on the same row in that window fails with `ReentrantEdit`. Dropping the
//! guard releases the row on every exit path, errors and panics included.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use nexus_common::error::{TableError, TableResult};

/// Shared "notification in progress" flag of one row.
#[derive(Clone, Default)]
pub struct EditFlag(Rc<Cell<bool>>);

impl EditFlag {
    /// Creates a released flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a guard is alive.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.0.get()
    }

    /// Fails with `ReentrantEdit` if a guard is alive.
    pub fn check(&self, operation: &'static str) -> TableResult<()> {
        if self.is_held() {
            return Err(TableError::ReentrantEdit { operation });
        }
        Ok(())
    }

    /// Acquires the flag for the lifetime of the returned guard.
    pub fn acquire(&self, operation: &'static str) -> TableResult<EditGuard> {
        self.check(operation)?;
        self.0.set(true);
        Ok(EditGuard {
            flag: Rc::clone(&self.0),
        })
    }
}

impl fmt::Debug for EditFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EditFlag({})", self.is_held())
    }
}

/// Releases its row's [`EditFlag`] when dropped.
#[must_use = "the row is released as soon as the guard is dropped"]
pub struct EditGuard {
    flag: Rc<Cell<bool>>,
}

impl fmt::Debug for EditGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditGuard").finish_non_exhaustive()
    }
}

impl Drop for EditGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

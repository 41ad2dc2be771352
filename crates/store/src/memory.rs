//! Single-lock transactional wrapper over the entity maps.

use parking_lot::RwLock;

use coalesce_core::error::MdmResult;

use crate::state::StoreState;

/// In-memory store with snapshot transactions. The write lock strictly
/// serializes mutating operations, so concurrent merges of overlapping
/// records cannot interleave.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    /// Run a read-only closure against a consistent view of the store.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutating closure transactionally: the closure works on a
    /// snapshot, which replaces the live state only when it returns `Ok`.
    /// Any error leaves the store untouched.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut StoreState) -> MdmResult<R>) -> MdmResult<R> {
        let mut guard = self.inner.write();
        let mut working = guard.clone();
        let result = f(&mut working)?;
        *guard = working;
        Ok(result)
    }
}

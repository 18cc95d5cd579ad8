//! Generational handles to pooled instances

use std::fmt;

/// Handle to an instance checked out of an [`IndexedObjectPool`].
///
/// The generation advances every time the instance goes back to its
/// free-list, so a handle kept past its checkin no longer resolves.
///
/// [`IndexedObjectPool`]: crate::IndexedObjectPool
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    index: u32,
    generation: u32,
}

impl InstanceHandle {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the pool
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({}v{})", self.index, self.generation)
    }
}

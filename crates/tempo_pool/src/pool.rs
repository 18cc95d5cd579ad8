//! Indexed object pool
//!
//! Every prototype index owns a LIFO free-list. Checking out pops the most
//! recently returned instance (or builds a new one from the prototype);
//! checking in detaches the instance and pushes it back onto the free-list
//! of the prototype it was built from.

use crate::error::{PoolError, Result};
use crate::handle::InstanceHandle;

/// Something the pool can hand out and take back.
///
/// The parent is an opaque attachment target (a scene node, a layer id...).
/// The pool stores it while the instance is checked out and passes it to
/// the hooks below, but never looks inside it.
pub trait Poolable {
    type Parent: Clone;

    /// Called when the instance is handed out under `parent`
    fn attach(&mut self, _parent: &Self::Parent) {}

    /// Called when the instance goes back to its free-list
    fn detach(&mut self) {}
}

/// Builds fresh instances for one prototype index
pub trait Prototype<I> {
    fn instantiate(&self) -> I;
}

impl<I, F> Prototype<I> for F
where
    F: Fn() -> I,
{
    fn instantiate(&self) -> I {
        self()
    }
}

/// Per-prototype pool statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances alive for this prototype (idle + active)
    pub constructed: usize,
    /// Instances waiting on the free-list
    pub idle: usize,
    /// Instances currently checked out
    pub active: usize,
}

struct Slot<I: Poolable> {
    instance: Option<I>,
    prototype: usize,
    /// `Some` exactly while checked out
    parent: Option<I::Parent>,
    generation: u32,
}

/// Pool of reusable instances grouped by prototype index
pub struct IndexedObjectPool<I: Poolable> {
    prototypes: Vec<Box<dyn Prototype<I>>>,
    slots: Vec<Slot<I>>,
    free_lists: Vec<Vec<u32>>,
    constructed: Vec<usize>,
    /// Slots emptied by `free_all`, reused before growing `slots`
    vacant: Vec<u32>,
    max_per_prototype: Option<usize>,
}

impl<I: Poolable> IndexedObjectPool<I> {
    /// Create a pool with no prototypes
    pub fn new() -> Self {
        Self {
            prototypes: Vec::new(),
            slots: Vec::new(),
            free_lists: Vec::new(),
            constructed: Vec::new(),
            vacant: Vec::new(),
            max_per_prototype: None,
        }
    }

    /// Create a pool over a list of prototypes; index `i` of the list is
    /// prototype index `i`.
    pub fn with_prototypes(prototypes: Vec<Box<dyn Prototype<I>>>) -> Self {
        let count = prototypes.len();
        Self {
            prototypes,
            free_lists: (0..count).map(|_| Vec::new()).collect(),
            constructed: vec![0; count],
            ..Self::new()
        }
    }

    /// Register a prototype (builder style)
    pub fn with_prototype(mut self, prototype: impl Prototype<I> + 'static) -> Self {
        self.add_prototype(prototype);
        self
    }

    /// Cap the number of instances any single prototype may own
    pub fn with_max_per_prototype(mut self, max: Option<usize>) -> Self {
        self.max_per_prototype = max;
        self
    }

    /// Register a prototype and return its index
    pub fn add_prototype(&mut self, prototype: impl Prototype<I> + 'static) -> usize {
        self.prototypes.push(Box::new(prototype));
        self.free_lists.push(Vec::new());
        self.constructed.push(0);
        self.prototypes.len() - 1
    }

    /// Number of registered prototypes
    pub fn prototype_count(&self) -> usize {
        self.prototypes.len()
    }

    pub fn max_per_prototype(&self) -> Option<usize> {
        self.max_per_prototype
    }

    /// Hand out an idle instance of `prototype`, building one if its
    /// free-list is empty, and attach it to `parent`.
    ///
    /// Fails only for an unknown prototype or when the optional cap is
    /// reached; without a cap the pool grows on demand.
    pub fn checkout(&mut self, prototype: usize, parent: I::Parent) -> Result<InstanceHandle> {
        self.check_prototype(prototype)?;

        let index = match self.free_lists[prototype].pop() {
            Some(index) => index,
            None => {
                if let Some(capacity) = self.max_per_prototype {
                    if self.constructed[prototype] >= capacity {
                        return Err(PoolError::Exhausted { prototype, capacity });
                    }
                }
                self.construct(prototype)
            }
        };

        let slot = &mut self.slots[index as usize];
        if let Some(instance) = slot.instance.as_mut() {
            instance.attach(&parent);
        }
        slot.parent = Some(parent);

        Ok(InstanceHandle::new(index, slot.generation))
    }

    /// Detach an instance and return it to its prototype's free-list.
    ///
    /// Returns `false` (and does nothing) for a handle that is already
    /// checked in or otherwise stale.
    pub fn checkin(&mut self, handle: InstanceHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index() as usize) else {
            return false;
        };

        if slot.generation != handle.generation() || slot.parent.take().is_none() {
            log::trace!("Ignoring checkin of detached {:?}", handle);
            return false;
        }

        if let Some(instance) = slot.instance.as_mut() {
            instance.detach();
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free_lists[slot.prototype].push(handle.index());

        true
    }

    /// Build up to `count` idle instances of `prototype` ahead of time.
    ///
    /// Returns how many were built; the cap, if any, is respected.
    pub fn prewarm(&mut self, prototype: usize, count: usize) -> Result<usize> {
        self.check_prototype(prototype)?;

        let room = match self.max_per_prototype {
            Some(capacity) => capacity.saturating_sub(self.constructed[prototype]),
            None => count,
        };
        let count = count.min(room);

        for _ in 0..count {
            let index = self.construct(prototype);
            self.free_lists[prototype].push(index);
        }

        Ok(count)
    }

    /// Destroy every idle instance. Checked-out instances are untouched.
    pub fn free_all(&mut self) {
        let mut destroyed = 0;

        for (prototype, free) in self.free_lists.iter_mut().enumerate() {
            for index in free.drain(..) {
                let slot = &mut self.slots[index as usize];
                slot.instance = None;
                slot.generation = slot.generation.wrapping_add(1);

                self.vacant.push(index);
                self.constructed[prototype] -= 1;
                destroyed += 1;
            }
        }

        log::info!("Freed {} pooled instances", destroyed);
    }

    /// The checked-out instance behind `handle`
    pub fn get(&self, handle: InstanceHandle) -> Option<&I> {
        let slot = self.active_slot(handle)?;
        slot.instance.as_ref()
    }

    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut I> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() || slot.parent.is_none() {
            return None;
        }
        slot.instance.as_mut()
    }

    /// Parent the instance is currently attached to
    pub fn parent_of(&self, handle: InstanceHandle) -> Option<&I::Parent> {
        self.active_slot(handle)?.parent.as_ref()
    }

    /// Prototype index the instance was built from
    pub fn prototype_of(&self, handle: InstanceHandle) -> Option<usize> {
        self.active_slot(handle).map(|slot| slot.prototype)
    }

    /// Whether `handle` refers to a checked-out instance
    pub fn is_checked_out(&self, handle: InstanceHandle) -> bool {
        self.active_slot(handle).is_some()
    }

    /// Statistics for one prototype
    pub fn stats(&self, prototype: usize) -> Option<PoolStats> {
        let constructed = *self.constructed.get(prototype)?;
        let idle = self.free_lists[prototype].len();

        Some(PoolStats {
            constructed,
            idle,
            active: constructed - idle,
        })
    }

    /// Idle instances of `prototype`
    pub fn idle_count(&self, prototype: usize) -> usize {
        self.free_lists.get(prototype).map_or(0, Vec::len)
    }

    /// Checked-out instances across all prototypes
    pub fn active_count(&self) -> usize {
        (0..self.prototypes.len())
            .filter_map(|prototype| self.stats(prototype))
            .map(|stats| stats.active)
            .sum()
    }

    fn check_prototype(&self, prototype: usize) -> Result<()> {
        if prototype < self.prototypes.len() {
            Ok(())
        } else {
            Err(PoolError::UnknownPrototype {
                index: prototype,
                count: self.prototypes.len(),
            })
        }
    }

    fn active_slot(&self, handle: InstanceHandle) -> Option<&Slot<I>> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation() && slot.parent.is_some())
    }

    /// Build an instance into a free slot. The caller decides whether it
    /// goes to a free-list or straight into use.
    fn construct(&mut self, prototype: usize) -> u32 {
        let instance = self.prototypes[prototype].instantiate();
        self.constructed[prototype] += 1;

        log::debug!(
            "Pool grew prototype {} to {} instances",
            prototype,
            self.constructed[prototype]
        );

        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(instance);
            slot.prototype = prototype;
            slot.parent = None;
            index
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                instance: Some(instance),
                prototype,
                parent: None,
                generation: 0,
            });
            index
        }
    }
}

impl<I: Poolable> Default for IndexedObjectPool<I> {
    fn default() -> Self {
        Self::new()
    }
}

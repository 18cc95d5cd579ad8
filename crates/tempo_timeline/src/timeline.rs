//! Object timeline
//!
//! Schedules actors on an interval tree keyed by their lifetime and, on
//! every tick, reconciles the actors overlapping the play-head against the
//! instances checked out of the pool.
//!
//! Reconciliation is a double-buffered mark-and-sweep. Actors returned by
//! the query are marked as in use; actors that were in use on the previous
//! tick but were not marked again are swept back into the pool; marked
//! actors without an instance then get one. An actor is therefore
//! deactivated on the first tick that does not return it, and an instance
//! released by the sweep can be reused by an activation of the same tick.

use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::sync::Arc;

use tempo_pool::{IndexedObjectPool, InstanceHandle, PoolError, Poolable, Prototype};
use tempo_structures::{Interval, IntervalTree};

use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::instance::TimelineInstance;

/// Identifier of a scheduled actor.
///
/// The generation changes when the actor's slot is reused, so an id kept
/// after [`ObjectTimeline::unschedule`] never refers to a newer actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

impl ActorId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({}v{})", self.index, self.generation)
    }
}

/// Outcome of one [`ObjectTimeline::tick`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Play-head time of the tick
    pub time: f32,
    /// Actors holding an instance after the tick
    pub active: usize,
    /// Instances checked out this tick
    pub activated: usize,
    /// Instances checked back in this tick
    pub deactivated: usize,
    /// Overlapping actors left without an instance because the pool is capped
    pub deferred: usize,
}

struct Actor<I: TimelineInstance> {
    interval: Interval<ActorId>,
    params: Arc<I::Params>,
    prototype: usize,
    parent: <I as Poolable>::Parent,
    live: Option<InstanceHandle>,
    /// Removed from the tree while holding an instance; freed by the sweep
    retired: bool,
}

struct ActorSlot<I: TimelineInstance> {
    actor: Option<Actor<I>>,
    generation: u32,
}

impl<I: TimelineInstance> ActorSlot<I> {
    fn release(&mut self) {
        self.actor = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

enum Activation {
    Kept,
    Activated,
    Deferred,
}

/// Drives pooled instances from a play-head time
pub struct ObjectTimeline<I: TimelineInstance> {
    tree: IntervalTree<ActorId>,
    actors: Vec<ActorSlot<I>>,
    vacant: Vec<u32>,
    pool: IndexedObjectPool<I>,
    visited: Vec<ActorId>,
    nodes_in_use: HashSet<ActorId>,
    to_be_removed: HashSet<ActorId>,
    config: TimelineConfig,
}

impl<I: TimelineInstance> ObjectTimeline<I> {
    /// Create a timeline around `pool`.
    ///
    /// A cap in `config` replaces the pool's own; the pool is prewarmed
    /// with `config.prewarm_per_prototype` idle instances per prototype.
    pub fn new(pool: IndexedObjectPool<I>, config: TimelineConfig) -> Result<Self> {
        let mut pool = match config.max_instances_per_prototype {
            Some(max) => pool.with_max_per_prototype(Some(max)),
            None => pool,
        };

        if config.prewarm_per_prototype > 0 {
            for prototype in 0..pool.prototype_count() {
                pool.prewarm(prototype, config.prewarm_per_prototype)?;
            }
        }

        let reserve = config.reserve_actors;
        log::debug!(
            "Creating object timeline: {} prototypes, reserve {}",
            pool.prototype_count(),
            reserve
        );

        Ok(Self {
            tree: IntervalTree::with_capacity(reserve),
            actors: Vec::with_capacity(reserve),
            vacant: Vec::new(),
            pool,
            visited: Vec::with_capacity(reserve),
            nodes_in_use: HashSet::with_capacity(reserve),
            to_be_removed: HashSet::with_capacity(reserve),
            config,
        })
    }

    /// Create a timeline with a fresh pool over `prototypes`
    pub fn with_prototypes(
        prototypes: Vec<Box<dyn Prototype<I>>>,
        config: TimelineConfig,
    ) -> Result<Self> {
        Self::new(IndexedObjectPool::with_prototypes(prototypes), config)
    }

    /// Register an actor alive over `[start, end]`.
    ///
    /// The actor gets an instance of `prototype`, attached under `parent`,
    /// on the first tick whose time falls inside its lifetime.
    pub fn schedule(
        &mut self,
        start: f32,
        end: f32,
        params: impl Into<Arc<I::Params>>,
        prototype: usize,
        parent: <I as Poolable>::Parent,
    ) -> Result<ActorId> {
        let count = self.pool.prototype_count();
        if prototype >= count {
            return Err(PoolError::UnknownPrototype {
                index: prototype,
                count,
            }
            .into());
        }

        let id = self.next_id();
        let interval = Interval::new(start, end, id)?;

        let actor = Actor {
            interval,
            params: params.into(),
            prototype,
            parent,
            live: None,
            retired: false,
        };

        if self.vacant.last() == Some(&id.index) {
            self.vacant.pop();
            self.actors[id.index as usize].actor = Some(actor);
        } else {
            self.actors.push(ActorSlot {
                actor: Some(actor),
                generation: id.generation,
            });
        }
        self.tree.insert(interval);

        log::debug!("Scheduled {} over {:?}", id, interval);
        Ok(id)
    }

    /// Remove an actor from the timeline.
    ///
    /// An actor holding an instance keeps it until the next tick's sweep
    /// returns it to the pool; the id is invalid immediately either way.
    pub fn unschedule(&mut self, id: ActorId) -> Result<()> {
        let (interval, live) = match self.actor(id) {
            Some(actor) => (actor.interval, actor.live.is_some()),
            None => return Err(TimelineError::UnknownActor(id)),
        };

        self.tree.delete(&interval);

        if live {
            if let Some(actor) = lookup_mut(&mut self.actors, id) {
                actor.retired = true;
            }
        } else {
            self.actors[id.index as usize].release();
            self.vacant.push(id.index);
            self.nodes_in_use.remove(&id);
            self.to_be_removed.remove(&id);
        }

        log::debug!("Unscheduled {}", id);
        Ok(())
    }

    /// Advance the play-head to `time` and reconcile instances.
    ///
    /// `time` may move backwards; membership is recomputed from the tree on
    /// every call.
    pub fn tick(&mut self, time: f32) -> TickReport {
        let mut report = TickReport {
            time,
            ..TickReport::default()
        };

        let mut visited = mem::take(&mut self.visited);
        visited.clear();
        self.tree.find_all(time, |node| visited.push(*node.value()));

        // Mark
        for &id in &visited {
            self.to_be_removed.remove(&id);
            self.nodes_in_use.insert(id);
        }

        // Sweep what the previous tick saw and this one did not
        let mut stale = mem::take(&mut self.to_be_removed);
        for id in stale.drain() {
            if self.deactivate(id) {
                report.deactivated += 1;
            }
        }

        for &id in &visited {
            match self.activate(id, time) {
                Some(Activation::Kept) => report.active += 1,
                Some(Activation::Activated) => {
                    report.active += 1;
                    report.activated += 1;
                }
                Some(Activation::Deferred) => report.deferred += 1,
                None => {}
            }
        }

        // Swap buffers; `stale` is empty and becomes the next mark set
        self.to_be_removed = mem::replace(&mut self.nodes_in_use, stale);
        self.visited = visited;

        report
    }

    /// Check every live instance back into the pool
    pub fn deactivate_all(&mut self) -> usize {
        let mut released = 0;

        for (index, slot) in self.actors.iter_mut().enumerate() {
            let Some(actor) = slot.actor.as_mut() else {
                continue;
            };
            let Some(handle) = actor.live.take() else {
                continue;
            };

            self.pool.checkin(handle);
            released += 1;

            if actor.retired {
                slot.release();
                self.vacant.push(index as u32);
            }
        }

        self.nodes_in_use.clear();
        self.to_be_removed.clear();

        if released > 0 {
            log::debug!("Deactivated {} instances", released);
        }
        released
    }

    /// Deactivate everything and destroy every pooled instance.
    ///
    /// Scheduled actors stay scheduled and are re-activated with fresh
    /// instances by later ticks.
    pub fn free_all(&mut self) {
        let released = self.deactivate_all();
        self.pool.free_all();
        log::info!(
            "Freed object timeline: {} actors scheduled, {} instances released",
            self.scheduled_count(),
            released
        );
    }

    /// Instance currently driven by `id`
    pub fn instance(&self, id: ActorId) -> Option<&I> {
        let handle = self.actor(id)?.live?;
        self.pool.get(handle)
    }

    pub fn instance_mut(&mut self, id: ActorId) -> Option<&mut I> {
        let handle = self.actor(id)?.live?;
        self.pool.get_mut(handle)
    }

    pub fn is_active(&self, id: ActorId) -> bool {
        self.actor(id).map_or(false, |actor| actor.live.is_some())
    }

    /// Lifetime of a scheduled actor
    pub fn interval(&self, id: ActorId) -> Option<&Interval<ActorId>> {
        self.actor(id).map(|actor| &actor.interval)
    }

    pub fn params(&self, id: ActorId) -> Option<&I::Params> {
        self.actor(id).map(|actor| actor.params.as_ref())
    }

    pub fn prototype_of(&self, id: ActorId) -> Option<usize> {
        self.actor(id).map(|actor| actor.prototype)
    }

    /// Actors currently scheduled
    pub fn scheduled_count(&self) -> usize {
        self.tree.len()
    }

    /// Instances currently checked out, unscheduled actors awaiting their
    /// sweep included
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn pool(&self) -> &IndexedObjectPool<I> {
        &self.pool
    }

    pub fn tree(&self) -> &IntervalTree<ActorId> {
        &self.tree
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    fn next_id(&self) -> ActorId {
        match self.vacant.last() {
            Some(&index) => ActorId {
                index,
                generation: self.actors[index as usize].generation,
            },
            None => ActorId {
                index: self.actors.len() as u32,
                generation: 0,
            },
        }
    }

    /// Scheduled (not retired) actor behind `id`
    fn actor(&self, id: ActorId) -> Option<&Actor<I>> {
        let slot = self.actors.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.actor.as_ref().filter(|actor| !actor.retired)
    }

    fn activate(&mut self, id: ActorId, time: f32) -> Option<Activation> {
        let actor = lookup_mut(&mut self.actors, id)?;

        let (handle, activation) = match actor.live {
            Some(handle) => (handle, Activation::Kept),
            None => match self.pool.checkout(actor.prototype, actor.parent.clone()) {
                Ok(handle) => {
                    if let Some(instance) = self.pool.get_mut(handle) {
                        instance.bind(Arc::clone(&actor.params));
                    }
                    actor.live = Some(handle);
                    log::trace!("Activated {} with {:?}", id, handle);
                    (handle, Activation::Activated)
                }
                Err(err) => {
                    log::debug!("Deferring activation of {}: {}", id, err);
                    return Some(Activation::Deferred);
                }
            },
        };

        if let Some(instance) = self.pool.get_mut(handle) {
            instance.evaluate(actor.interval.local_time(time));
        }

        Some(activation)
    }

    /// Return the instance of `id` to the pool; `false` if it held none
    fn deactivate(&mut self, id: ActorId) -> bool {
        let Some(actor) = lookup_mut(&mut self.actors, id) else {
            return false;
        };
        let Some(handle) = actor.live.take() else {
            return false;
        };

        self.pool.checkin(handle);
        log::trace!("Deactivated {} from {:?}", id, handle);

        if actor.retired {
            self.actors[id.index as usize].release();
            self.vacant.push(id.index);
        }
        true
    }
}

/// Any actor behind `id`, retired ones included
fn lookup_mut<I: TimelineInstance>(
    actors: &mut [ActorSlot<I>],
    id: ActorId,
) -> Option<&mut Actor<I>> {
    let slot = actors.get_mut(id.index as usize)?;
    if slot.generation != id.generation {
        return None;
    }
    slot.actor.as_mut()
}

impl<I: TimelineInstance> fmt::Debug for ObjectTimeline<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTimeline")
            .field("scheduled", &self.tree.len())
            .field("active", &self.pool.active_count())
            .field("prototypes", &self.pool.prototype_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::TransformInstance;
    use crate::keyframe::Keyframe;
    use crate::params::ActorParams;
    use tempo_math::Vec2;
    use tempo_structures::IntervalError;

    type Timeline = ObjectTimeline<TransformInstance<u32>>;

    fn timeline(prototypes: usize) -> Timeline {
        let mut pool = IndexedObjectPool::new();
        for _ in 0..prototypes {
            pool.add_prototype(TransformInstance::<u32>::new);
        }
        ObjectTimeline::new(pool, TimelineConfig::default()).unwrap()
    }

    fn diagonal() -> ActorParams {
        let mut params = ActorParams::new();
        params
            .position
            .add(0.0, 1.0, Keyframe::linear(Vec2::ZERO, Vec2::new(10.0, 10.0)))
            .unwrap();
        params
    }

    #[test]
    fn test_position_follows_local_time() {
        let mut timeline = timeline(1);
        let id = timeline.schedule(0.0, 10.0, diagonal(), 0, 1).unwrap();

        let report = timeline.tick(5.0);
        assert_eq!(report.activated, 1);

        let instance = timeline.instance(id).unwrap();
        assert_eq!(instance.local_time(), 0.5);
        assert_eq!(instance.transform().position, Vec2::new(5.0, 5.0));
        assert_eq!(instance.parent(), Some(&1));
    }

    #[test]
    fn test_actor_returns_to_pool_after_lifetime() {
        let mut timeline = timeline(1);
        let id = timeline.schedule(0.0, 10.0, ActorParams::new(), 0, 0).unwrap();

        timeline.tick(1.0);
        assert!(timeline.is_active(id));
        assert_eq!(timeline.pool().idle_count(0), 0);

        for t in 2..=9 {
            let report = timeline.tick(t as f32);
            assert_eq!(report.activated, 0);
            assert_eq!(report.deactivated, 0);
        }

        let report = timeline.tick(11.0);
        assert_eq!(report.deactivated, 1);
        assert!(!timeline.is_active(id));
        assert_eq!(timeline.pool().idle_count(0), 1);
        assert_eq!(timeline.pool().stats(0).unwrap().constructed, 1);
    }

    #[test]
    fn test_unscheduled_active_actor_is_swept() {
        let mut timeline = timeline(1);
        let id = timeline.schedule(0.0, 10.0, ActorParams::new(), 0, 0).unwrap();

        timeline.tick(5.0);
        timeline.unschedule(id).unwrap();

        assert_eq!(timeline.scheduled_count(), 0);
        assert_eq!(timeline.active_count(), 1);
        assert!(timeline.instance(id).is_none());

        let report = timeline.tick(5.5);
        assert_eq!(report.deactivated, 1);
        assert_eq!(timeline.active_count(), 0);
        assert_eq!(timeline.pool().idle_count(0), 1);
    }

    #[test]
    fn test_unschedule_twice_fails() {
        let mut timeline = timeline(1);
        let id = timeline.schedule(0.0, 1.0, ActorParams::new(), 0, 0).unwrap();

        timeline.unschedule(id).unwrap();
        assert_eq!(
            timeline.unschedule(id),
            Err(TimelineError::UnknownActor(id))
        );
    }

    #[test]
    fn test_reversed_lifetime_is_rejected() {
        let mut timeline = timeline(1);
        let result = timeline.schedule(5.0, 2.0, ActorParams::new(), 0, 0);

        assert_eq!(
            result,
            Err(TimelineError::Interval(IntervalError::InvalidRange {
                start: 5.0,
                end: 2.0
            }))
        );
        assert_eq!(timeline.scheduled_count(), 0);
    }

    #[test]
    fn test_unknown_prototype_is_rejected() {
        let mut timeline = timeline(2);
        let result = timeline.schedule(0.0, 1.0, ActorParams::new(), 2, 0);

        assert_eq!(
            result,
            Err(TimelineError::Pool(PoolError::UnknownPrototype {
                index: 2,
                count: 2
            }))
        );
    }

    #[test]
    fn test_identical_lifetimes_unschedule_by_identity() {
        let mut timeline = timeline(1);
        let first = timeline.schedule(0.0, 4.0, ActorParams::new(), 0, 1).unwrap();
        let second = timeline.schedule(0.0, 4.0, ActorParams::new(), 0, 2).unwrap();

        timeline.unschedule(first).unwrap();
        timeline.tick(2.0);

        assert!(timeline.instance(first).is_none());
        assert_eq!(timeline.instance(second).unwrap().parent(), Some(&2));
    }

    #[test]
    fn test_stale_id_does_not_alias_new_actor() {
        let mut timeline = timeline(1);
        let old = timeline.schedule(0.0, 1.0, ActorParams::new(), 0, 0).unwrap();
        timeline.unschedule(old).unwrap();

        let new = timeline.schedule(0.0, 1.0, ActorParams::new(), 0, 0).unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(timeline.interval(old).is_none());
        assert!(timeline.interval(new).is_some());
    }

    #[test]
    fn test_capped_pool_defers_activation() {
        let mut pool = IndexedObjectPool::new();
        pool.add_prototype(TransformInstance::<u32>::new);
        let config = TimelineConfig::default().with_max_instances(1);
        let mut timeline = ObjectTimeline::new(pool, config).unwrap();

        let a = timeline.schedule(0.0, 2.0, ActorParams::new(), 0, 0).unwrap();
        let b = timeline.schedule(1.0, 4.0, ActorParams::new(), 0, 0).unwrap();

        timeline.tick(0.5);
        let report = timeline.tick(1.5);
        assert_eq!(report.deferred, 1);
        assert!(timeline.is_active(a));
        assert!(!timeline.is_active(b));

        // `a` is swept at 3.0 and its instance goes straight to `b`
        let report = timeline.tick(3.0);
        assert_eq!(report.deactivated, 1);
        assert_eq!(report.activated, 1);
        assert!(timeline.is_active(b));
        assert_eq!(timeline.pool().stats(0).unwrap().constructed, 1);
    }

    #[test]
    fn test_deactivate_all_and_reactivate() {
        let mut timeline = timeline(1);
        let id = timeline.schedule(0.0, 10.0, ActorParams::new(), 0, 0).unwrap();

        timeline.tick(1.0);
        assert_eq!(timeline.deactivate_all(), 1);
        assert!(!timeline.is_active(id));

        let report = timeline.tick(2.0);
        assert_eq!(report.activated, 1);
        assert_eq!(timeline.pool().stats(0).unwrap().constructed, 1);
    }

    #[test]
    fn test_free_all_destroys_instances() {
        let mut timeline = timeline(1);
        timeline.schedule(0.0, 10.0, ActorParams::new(), 0, 0).unwrap();

        timeline.tick(1.0);
        timeline.free_all();

        let stats = timeline.pool().stats(0).unwrap();
        assert_eq!(stats.constructed, 0);
        assert_eq!(timeline.scheduled_count(), 1);
    }
}

//! Instances driven by the timeline

use std::sync::Arc;

use tempo_pool::Poolable;

use crate::params::{ActorParams, ChannelCaches, Transform2D};

/// What the timeline needs from a pooled instance.
///
/// `bind` is called once per activation with the actor's parameters,
/// `evaluate` on every tick the actor stays active with its normalized
/// local time.
pub trait TimelineInstance: Poolable {
    type Params;

    fn bind(&mut self, params: Arc<Self::Params>);

    fn evaluate(&mut self, local_time: f32);
}

/// Ready-made instance that evaluates [`ActorParams`] into a
/// [`Transform2D`]. The scene layer reads [`transform`](Self::transform)
/// after each tick.
#[derive(Debug)]
pub struct TransformInstance<P> {
    params: Option<Arc<ActorParams>>,
    caches: ChannelCaches,
    transform: Transform2D,
    parent: Option<P>,
    local_time: f32,
    activations: u32,
}

impl<P> TransformInstance<P> {
    pub fn new() -> Self {
        Self {
            params: None,
            caches: ChannelCaches::default(),
            transform: Transform2D::IDENTITY,
            parent: None,
            local_time: 0.0,
            activations: 0,
        }
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn parent(&self) -> Option<&P> {
        self.parent.as_ref()
    }

    pub fn params(&self) -> Option<&ActorParams> {
        self.params.as_deref()
    }

    /// Local time passed to the last `evaluate`
    pub fn local_time(&self) -> f32 {
        self.local_time
    }

    /// Number of times this instance has been bound to an actor
    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn is_bound(&self) -> bool {
        self.params.is_some()
    }
}

impl<P> Default for TransformInstance<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone> Poolable for TransformInstance<P> {
    type Parent = P;

    fn attach(&mut self, parent: &P) {
        self.parent = Some(parent.clone());
    }

    fn detach(&mut self) {
        self.parent = None;
        self.params = None;
    }
}

impl<P: Clone> TimelineInstance for TransformInstance<P> {
    type Params = ActorParams;

    fn bind(&mut self, params: Arc<ActorParams>) {
        self.params = Some(params);
        self.caches = ChannelCaches::default();
        self.transform = Transform2D::IDENTITY;
        self.local_time = 0.0;
        self.activations += 1;
    }

    fn evaluate(&mut self, local_time: f32) {
        self.local_time = local_time;
        if let Some(params) = &self.params {
            params.apply_cached(&mut self.caches, local_time, &mut self.transform);
        }
    }
}

//! Keyframes and keyframe tracks
//!
//! A track covers an actor's normalized lifetime [0, 1]. Each keyframe
//! owns a sub-range of it and blends between two values along a Bezier
//! ease curve.

use tempo_math::{clamp01, BezierCurve, Lerp};
use tempo_structures::{Interval, IntervalTree, SearchCache};

use crate::error::Result;

/// Blend from `start` to `end` along `curve`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<V> {
    pub start: V,
    pub end: V,
    pub curve: BezierCurve,
}

impl<V: Lerp> Keyframe<V> {
    pub const fn new(start: V, end: V, curve: BezierCurve) -> Self {
        Self { start, end, curve }
    }

    pub const fn linear(start: V, end: V) -> Self {
        Self::new(start, end, BezierCurve::LINEAR)
    }

    pub const fn eased(start: V, end: V, curve: BezierCurve) -> Self {
        Self::new(start, end, curve)
    }

    /// Constant value over the keyframe's whole range
    pub const fn hold(value: V) -> Self {
        Self::new(value, value, BezierCurve::LINEAR)
    }

    /// Value at keyframe-local progress `t` in [0, 1]
    #[inline]
    pub fn value_at(&self, t: f32) -> V {
        Lerp::lerp(self.start, self.end, self.curve.ease(t))
    }
}

/// Keyframes of one channel, indexed by normalized actor time
#[derive(Clone, Debug)]
pub struct KeyframeTrack<V> {
    frames: IntervalTree<Keyframe<V>>,
}

impl<V: Lerp> KeyframeTrack<V> {
    pub fn new() -> Self {
        Self {
            frames: IntervalTree::new(),
        }
    }

    /// Add a keyframe covering `[start, end]` of the actor's lifetime.
    /// Both bounds are clamped into [0, 1] first.
    pub fn add(&mut self, start: f32, end: f32, keyframe: Keyframe<V>) -> Result<()> {
        let interval = Interval::new(clamp01(start), clamp01(end), keyframe)?;
        self.frames.insert(interval);
        Ok(())
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, start: f32, end: f32, keyframe: Keyframe<V>) -> Result<Self> {
        self.add(start, end, keyframe)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &IntervalTree<Keyframe<V>> {
        &self.frames
    }

    /// Channel value at normalized actor time `t`, `None` if no keyframe
    /// covers it
    pub fn sample(&self, t: f32) -> Option<V> {
        let node = self.frames.find_one(t)?;
        Some(evaluate(node.interval(), t))
    }

    /// [`sample`](Self::sample) through a caller-owned search cache
    pub fn sample_cached(&self, cache: &mut SearchCache, t: f32) -> Option<V> {
        let node = self.frames.cached_search(cache, t)?;
        Some(evaluate(node.interval(), t))
    }
}

impl<V> Default for KeyframeTrack<V> {
    fn default() -> Self {
        Self {
            frames: IntervalTree::new(),
        }
    }
}

#[inline]
fn evaluate<V: Lerp>(interval: &Interval<Keyframe<V>>, t: f32) -> V {
    interval.value().value_at(interval.local_time(t))
}

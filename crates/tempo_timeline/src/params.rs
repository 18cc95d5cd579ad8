//! Actor parameters and the transform they drive

use tempo_math::{consts::MIN_SCALE, Color, Vec2};
use tempo_structures::SearchCache;

use crate::keyframe::KeyframeTrack;

/// Evaluated 2D transform of an actor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub scale: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    pub color: Color,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
        rotation: 0.0,
        color: Color::WHITE,
    };
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Keyframe tracks of one actor, indexed by normalized lifetime.
///
/// Built once when the actor is scheduled and shared read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ActorParams {
    pub position: KeyframeTrack<Vec2>,
    pub scale: KeyframeTrack<Vec2>,
    pub rotation: KeyframeTrack<f32>,
    pub color: KeyframeTrack<Color>,
}

/// One search cache per channel of [`ActorParams`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelCaches {
    pub position: SearchCache,
    pub scale: SearchCache,
    pub rotation: SearchCache,
    pub color: SearchCache,
}

impl ActorParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every channel that has a keyframe at `t` into `transform`;
    /// uncovered channels keep their previous value.
    pub fn apply(&self, t: f32, transform: &mut Transform2D) {
        if let Some(position) = self.position.sample(t) {
            transform.position = position;
        }
        if let Some(scale) = self.scale.sample(t) {
            transform.scale = clamp_scale(scale);
        }
        if let Some(rotation) = self.rotation.sample(t) {
            transform.rotation = rotation;
        }
        if let Some(color) = self.color.sample(t) {
            transform.color = color;
        }
    }

    /// [`apply`](Self::apply) using per-channel search caches
    pub fn apply_cached(&self, caches: &mut ChannelCaches, t: f32, transform: &mut Transform2D) {
        if let Some(position) = self.position.sample_cached(&mut caches.position, t) {
            transform.position = position;
        }
        if let Some(scale) = self.scale.sample_cached(&mut caches.scale, t) {
            transform.scale = clamp_scale(scale);
        }
        if let Some(rotation) = self.rotation.sample_cached(&mut caches.rotation, t) {
            transform.rotation = rotation;
        }
        if let Some(color) = self.color.sample_cached(&mut caches.color, t) {
            transform.color = color;
        }
    }

    /// Transform at `t`, starting from identity
    pub fn transform_at(&self, t: f32) -> Transform2D {
        let mut transform = Transform2D::IDENTITY;
        self.apply(t, &mut transform);
        transform
    }
}

/// Collapsed or mirrored scale is kept at a small positive size
#[inline]
fn clamp_scale(scale: Vec2) -> Vec2 {
    Vec2::new(
        if scale.x <= 0.0 { MIN_SCALE } else { scale.x },
        if scale.y <= 0.0 { MIN_SCALE } else { scale.y },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;
    use approx::assert_abs_diff_eq;
    use tempo_math::BezierCurve;

    #[test]
    fn test_position_halfway() {
        let mut params = ActorParams::new();
        params
            .position
            .add(0.0, 1.0, Keyframe::linear(Vec2::ZERO, Vec2::new(10.0, 10.0)))
            .unwrap();

        assert_eq!(params.transform_at(0.5).position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_uncovered_channels_are_untouched() {
        let mut params = ActorParams::new();
        params.rotation.add(0.0, 0.5, Keyframe::linear(0.0, 90.0)).unwrap();

        let mut transform = Transform2D::IDENTITY;
        transform.position = Vec2::new(3.0, 4.0);
        params.apply(0.25, &mut transform);
        assert_abs_diff_eq!(transform.rotation, 45.0);
        assert_eq!(transform.position, Vec2::new(3.0, 4.0));

        // Past the rotation keyframe the last written value stays
        params.apply(0.75, &mut transform);
        assert_abs_diff_eq!(transform.rotation, 45.0);
    }

    #[test]
    fn test_scale_never_collapses() {
        let mut params = ActorParams::new();
        params
            .scale
            .add(0.0, 1.0, Keyframe::linear(Vec2::ONE, Vec2::new(-1.0, 0.0)))
            .unwrap();

        let scale = params.transform_at(1.0).scale;
        assert_eq!(scale, Vec2::splat(MIN_SCALE));
    }

    #[test]
    fn test_cached_apply_matches_apply() {
        let mut params = ActorParams::new();
        params
            .color
            .add(0.0, 0.6, Keyframe::new(Color::BLACK, Color::WHITE, BezierCurve::EASE_OUT))
            .unwrap();
        params
            .position
            .add(0.1, 0.9, Keyframe::new(Vec2::ZERO, Vec2::ONE, BezierCurve::QUART_IN_OUT))
            .unwrap();

        let mut caches = ChannelCaches::default();
        let mut cached = Transform2D::IDENTITY;
        let mut plain = Transform2D::IDENTITY;

        for step in 0..=60 {
            let t = step as f32 / 60.0;
            params.apply_cached(&mut caches, t, &mut cached);
            params.apply(t, &mut plain);
            assert_eq!(cached, plain);
        }
    }
}

//! # tempo_math - Playback Math
//!
//! Small value types shared by the timeline runtime:
//! - `Vec2` and `Color` with component-wise interpolation
//! - `BezierCurve` ease curves with the usual CSS presets
//! - The `Lerp` trait used by keyframes to blend any of the above

#![cfg_attr(not(feature = "std"), no_std)]

pub mod vector;
pub mod color;
pub mod bezier;

pub use vector::*;
pub use color::*;
pub use bezier::*;

/// Common math constants
pub mod consts {
    /// Smallest scale component an actor may end up with
    pub const MIN_SCALE: f32 = 0.01;
    pub const EPSILON: f32 = 1e-6;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}

/// Clamp value into [0, 1]
#[inline]
pub fn clamp01(value: f32) -> f32 {
    clamp(value, 0.0, 1.0)
}

/// Values that can be blended between two endpoints.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        lerp(self, other, t)
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec2::lerp(self, other, t)
    }
}

impl Lerp for Color {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

pub mod prelude {
    pub use crate::vector::Vec2;
    pub use crate::color::Color;
    pub use crate::bezier::BezierCurve;
    pub use crate::{lerp, clamp, clamp01, Lerp};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(0.25), 0.25);
        assert_eq!(clamp01(3.0), 1.0);
    }

    #[test]
    fn test_lerp_trait_matches_free_function() {
        assert_eq!(Lerp::lerp(2.0_f32, 6.0, 0.25), lerp(2.0, 6.0, 0.25));
        assert_eq!(
            Lerp::lerp(Vec2::ZERO, Vec2::new(10.0, 20.0), 0.5),
            Vec2::new(5.0, 10.0)
        );
    }
}

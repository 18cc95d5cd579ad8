//! Cubic Bezier ease curves
//!
//! A curve is described by its two inner control points; the outer anchors
//! are fixed at (0, 0) and (1, 1). Evaluation is a pure function of the
//! curve and the progress value, so results can be cached or computed on
//! any thread.

use crate::{clamp01, Vec2};

/// Cubic Bezier ease curve with implicit anchors at (0, 0) and (1, 1)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BezierCurve {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl BezierCurve {
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const EASE_IN: Self = Self::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);

    pub const CUBIC_IN: Self = Self::new(0.55, 0.055, 0.675, 0.19);
    pub const CUBIC_OUT: Self = Self::new(0.215, 0.61, 0.355, 1.0);
    pub const CUBIC_IN_OUT: Self = Self::new(0.645, 0.045, 0.355, 1.0);

    pub const QUART_IN: Self = Self::new(0.895, 0.03, 0.685, 0.22);
    pub const QUART_OUT: Self = Self::new(0.165, 0.84, 0.44, 1.0);
    pub const QUART_IN_OUT: Self = Self::new(0.77, 0.0, 0.175, 1.0);

    pub const QUINT_IN: Self = Self::new(0.755, 0.05, 0.855, 0.06);
    pub const QUINT_OUT: Self = Self::new(0.23, 1.0, 0.32, 1.0);
    pub const QUINT_IN_OUT: Self = Self::new(0.86, 0.0, 0.07, 1.0);

    pub const SINE_IN: Self = Self::new(0.47, 0.0, 0.745, 0.715);
    pub const SINE_OUT: Self = Self::new(0.39, 0.575, 0.565, 1.0);
    pub const SINE_IN_OUT: Self = Self::new(0.445, 0.05, 0.55, 0.95);

    /// Create a curve from the coordinates of both control points
    #[inline]
    pub const fn new(p1x: f32, p1y: f32, p2x: f32, p2y: f32) -> Self {
        Self {
            p1: Vec2::new(p1x, p1y),
            p2: Vec2::new(p2x, p2y),
        }
    }

    #[inline]
    pub const fn from_points(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// `[p1.x, p1.y, p2.x, p2.y]`
    #[inline]
    pub const fn from_array(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.p1.x, self.p1.y, self.p2.x, self.p2.y]
    }

    /// Whether the control points sit on the anchors
    #[inline]
    pub fn is_linear(&self) -> bool {
        self.p1 == Vec2::ZERO && self.p2 == Vec2::ONE
    }

    /// Point on the curve at parameter `t` (clamped to [0, 1])
    pub fn sample(&self, t: f32) -> Vec2 {
        let t = clamp01(t);

        if self.is_linear() {
            return Vec2::splat(t);
        }

        let t2 = t * t;
        let t3 = t2 * t;

        let u = 1.0 - t;
        let u2 = u * u;

        // p0 is the origin, so its term vanishes
        self.p1 * (3.0 * u2 * t) + self.p2 * (3.0 * u * t2) + Vec2::ONE * t3
    }

    /// Eased progress for `t`: the vertical component of the curve
    #[inline]
    pub fn ease(&self, t: f32) -> f32 {
        self.sample(t).y
    }
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl From<[f32; 4]> for BezierCurve {
    #[inline]
    fn from(v: [f32; 4]) -> Self {
        Self::from_array(v)
    }
}

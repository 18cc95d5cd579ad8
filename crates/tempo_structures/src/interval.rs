//! Closed time ranges

use std::cmp::Ordering;
use std::fmt;

use crate::error::{IntervalError, Result};

/// Closed range `[start, end]` on the time axis carrying a value.
///
/// Intervals are immutable once built; changing one inside a tree means
/// deleting it and inserting a replacement.
#[derive(Clone, Copy, PartialEq)]
pub struct Interval<T> {
    start: f32,
    end: f32,
    value: T,
}

impl<T> Interval<T> {
    /// Create a new interval, rejecting `start > end` and NaN bounds
    pub fn new(start: f32, end: f32, value: T) -> Result<Self> {
        if start.is_nan() || end.is_nan() || start > end {
            return Err(IntervalError::InvalidRange { start, end });
        }

        Ok(Self { start, end, value })
    }

    #[inline]
    pub fn start(&self) -> f32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Duration of the interval
    #[inline]
    pub fn zoom(&self) -> f32 {
        self.end - self.start
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Whether `start <= time <= end`
    #[inline]
    pub fn contains(&self, time: f32) -> bool {
        self.start <= time && time <= self.end
    }

    /// Position of `time` inside the interval normalized to its duration.
    ///
    /// Zero-length intervals report `1.0`.
    #[inline]
    pub fn local_time(&self, time: f32) -> f32 {
        let zoom = self.zoom();
        if zoom > 0.0 {
            (time - self.start) / zoom
        } else {
            1.0
        }
    }

    /// Tree ordering: by start, then by end
    #[inline]
    pub fn cmp_range<U>(&self, other: &Interval<U>) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then_with(|| self.end.total_cmp(&other.end))
    }

    /// Same bounds, regardless of payload
    #[inline]
    pub fn same_range<U>(&self, other: &Interval<U>) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl<T: fmt::Debug> fmt::Debug for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] {:?}", self.start, self.end, self.value)
    }
}

//! Error types for interval construction

use thiserror::Error;

/// Interval errors
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IntervalError {
    /// Start lies after end, or a bound is NaN
    #[error("Invalid interval range: [{start}, {end}]")]
    InvalidRange { start: f32, end: f32 },
}

/// Result type for interval operations
pub type Result<T> = std::result::Result<T, IntervalError>;

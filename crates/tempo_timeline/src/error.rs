//! Error types for the timeline

use tempo_pool::PoolError;
use tempo_structures::IntervalError;
use thiserror::Error;

use crate::timeline::ActorId;

/// Timeline errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// Malformed lifetime or keyframe range
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// Pool rejected the request
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Actor was never scheduled or has been unscheduled
    #[error("Unknown actor: {0}")]
    UnknownActor(ActorId),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

//! Error types for the object pool

use thiserror::Error;

/// Pool errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No prototype registered at this index
    #[error("Unknown prototype index {index} (pool has {count} prototypes)")]
    UnknownPrototype { index: usize, count: usize },

    /// The per-prototype cap is reached and every instance is in use
    #[error("Pool for prototype {prototype} exhausted ({capacity} instances in use)")]
    Exhausted { prototype: usize, capacity: usize },
}

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

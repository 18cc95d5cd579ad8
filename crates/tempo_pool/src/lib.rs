//! # tempo_pool - Indexed Object Pool
//!
//! Keeps one free-list of idle instances per prototype ("archetype") so
//! short-lived actors can be shown and hidden every frame without
//! constructing or destroying anything in steady state.
//!
//! The pool is the sole owner of instance storage. Callers hold
//! generational [`InstanceHandle`]s, never references, so an instance can
//! be in exactly one place at a time: a free-list or the caller's active
//! set.

pub mod error;
pub mod handle;
pub mod pool;

pub use error::{PoolError, Result};
pub use handle::InstanceHandle;
pub use pool::{IndexedObjectPool, PoolStats, Poolable, Prototype};

pub mod prelude {
    pub use crate::error::PoolError;
    pub use crate::handle::InstanceHandle;
    pub use crate::pool::{IndexedObjectPool, PoolStats, Poolable, Prototype};
}

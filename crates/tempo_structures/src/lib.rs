//! # tempo_structures - Temporal Data Structures
//!
//! Structures for answering "what is alive at time t?":
//! - Interval: a validated closed range carrying a payload
//! - IntervalTree: AVL tree augmented with the max end-time per subtree
//! - SearchCache: caller-owned one-entry cache for near-monotonic lookups

pub mod error;
pub mod interval;
pub mod interval_tree;

pub use error::{IntervalError, Result};
pub use interval::Interval;
pub use interval_tree::{IntervalTree, Iter, Node, SearchCache};

pub mod prelude {
    pub use crate::error::IntervalError;
    pub use crate::interval::Interval;
    pub use crate::interval_tree::{IntervalTree, Node, SearchCache};
}

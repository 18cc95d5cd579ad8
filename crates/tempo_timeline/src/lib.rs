//! # tempo_timeline - Object Timeline
//!
//! Drives a large population of short-lived actors from a play-head time:
//! - `ObjectTimeline` indexes actor lifetimes in an interval tree and, on
//!   every tick, checks instances out of an `IndexedObjectPool` for actors
//!   that start overlapping and back in for actors that stopped
//! - `TimelineInstance` is the contract pooled instances implement
//!   (`bind` once per activation, `evaluate` once per tick)
//! - `KeyframeTrack` and `ActorParams` turn an actor's normalized local
//!   time into a `Transform2D` through Bezier-eased keyframes
//!
//! ```ignore
//! let mut timeline = ObjectTimeline::with_prototypes(prototypes, TimelineConfig::default())?;
//! let id = timeline.schedule(0.0, 10.0, params, 0, layer)?;
//! let report = timeline.tick(music_time);
//! ```

pub mod config;
pub mod error;
pub mod instance;
pub mod keyframe;
pub mod params;
pub mod timeline;

pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use instance::{TimelineInstance, TransformInstance};
pub use keyframe::{Keyframe, KeyframeTrack};
pub use params::{ActorParams, ChannelCaches, Transform2D};
pub use timeline::{ActorId, ObjectTimeline, TickReport};

pub mod prelude {
    pub use crate::config::TimelineConfig;
    pub use crate::error::TimelineError;
    pub use crate::instance::{TimelineInstance, TransformInstance};
    pub use crate::keyframe::{Keyframe, KeyframeTrack};
    pub use crate::params::{ActorParams, Transform2D};
    pub use crate::timeline::{ActorId, ObjectTimeline, TickReport};
    pub use tempo_math::prelude::*;
    pub use tempo_pool::prelude::*;
}

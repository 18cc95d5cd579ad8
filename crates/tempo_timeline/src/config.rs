//! Timeline configuration

use serde::{Deserialize, Serialize};

/// Object timeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Hard cap on instances per prototype. When reached, activations are
    /// deferred to a later tick instead of growing the pool.
    pub max_instances_per_prototype: Option<usize>,

    /// Idle instances built for every prototype up front
    pub prewarm_per_prototype: usize,

    /// Actors expected to be scheduled; sizes the bookkeeping so
    /// steady-state ticks do not allocate
    pub reserve_actors: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            max_instances_per_prototype: None,
            prewarm_per_prototype: 0,
            reserve_actors: 256,
        }
    }
}

impl TimelineConfig {
    /// Configuration for a dense level: thousands of actors, a warm pool
    pub fn dense() -> Self {
        Self {
            prewarm_per_prototype: 64,
            reserve_actors: 4096,
            ..Default::default()
        }
    }

    /// Cap instances per prototype
    pub fn with_max_instances(mut self, max: usize) -> Self {
        self.max_instances_per_prototype = Some(max);
        self
    }

    /// Set the number of idle instances built per prototype
    pub fn with_prewarm(mut self, count: usize) -> Self {
        self.prewarm_per_prototype = count;
        self
    }

    /// Set the expected number of scheduled actors
    pub fn with_reserve(mut self, actors: usize) -> Self {
        self.reserve_actors = actors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: TimelineConfig =
            serde_json::from_str(r#"{ "max_instances_per_prototype": 12 }"#).unwrap();

        assert_eq!(config.max_instances_per_prototype, Some(12));
        assert_eq!(config.prewarm_per_prototype, 0);
        assert_eq!(config.reserve_actors, 256);
    }

    #[test]
    fn test_json_round_trip() {
        let config = TimelineConfig::dense().with_max_instances(100);
        let json = serde_json::to_string(&config).unwrap();
        let back: TimelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

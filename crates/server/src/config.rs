//! Loader configuration.

use pipeline::DEFAULT_WORKERS;
use serde::{Deserialize, Serialize};

use crate::recommend::DEFAULT_THRESHOLD;

/// Settings for one graph load and the recommendations that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Concurrent store sessions during the node and relation phases
    pub workers: usize,
    /// Create natural-key indexes when loading into an empty store
    pub create_indexes: bool,
    /// Recommendation score must be strictly above this
    pub threshold: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            create_indexes: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl LoaderConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_indexes(mut self, create_indexes: bool) -> Self {
        self.create_indexes = create_indexes;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.workers, 8);
        assert!(config.create_indexes);
        assert_eq!(config.threshold, 4);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: LoaderConfig = serde_json::from_str(r#"{"workers": 2}"#).unwrap();
        assert_eq!(config.workers, 2);
        assert!(config.create_indexes);
        assert_eq!(config.threshold, 4);
    }
}

//! Engine configuration.

use semindex_types::Settings;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::hnsw::HnswConfig;
use crate::store::GrowthPolicy;

/// Index engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pairs committed per batch
    pub batch_size: usize,
    /// Store over-allocation policy
    pub growth: GrowthPolicy,
    /// Default ANN backend parameters
    pub hnsw: HnswConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            growth: GrowthPolicy::default(),
            hnsw: HnswConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size,
            growth: GrowthPolicy::new(settings.growth_factor),
            hnsw: HnswConfig::from_settings(settings),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth = GrowthPolicy::new(factor);
        self
    }

    pub fn with_hnsw(mut self, hnsw: HnswConfig) -> Self {
        self.hnsw = hnsw;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semindex_types::DistanceMetric;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.batch_size, 2048);
        assert_eq!(config.growth.factor, 20);
        assert_eq!(config.hnsw.expansion_add, 32);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            batch_size: 100,
            growth_factor: 2,
            metric: DistanceMetric::Cosine,
            ..Default::default()
        };
        let config = EngineConfig::from_settings(&settings);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.growth, GrowthPolicy::new(2));
        assert_eq!(config.hnsw.metric, DistanceMetric::Cosine);
    }
}

//! Hot-swappable configuration handle

use crate::config::{Config, ConfigValidator};
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared, atomically replaceable configuration
///
/// Readers take a snapshot (`Arc<Config>`) and keep it for the whole request.
/// Updates are validated before the pointer swap, so a rejected update leaves
/// the previous configuration in place.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl SharedConfig {
    /// Wrap a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        ConfigValidator::validate(&config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    /// Current configuration snapshot
    pub fn snapshot(&self) -> Arc<Config> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate and install a new configuration
    pub fn update(&self, config: Config) -> Result<()> {
        ConfigValidator::validate(&config)?;

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
        tracing::info!("Configuration updated");
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(Config::default()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_update() {
        let shared = SharedConfig::default();
        let before = shared.snapshot();

        let mut next = Config::default();
        next.retrieval.hybrid_limit = 50;
        shared.update(next).unwrap();

        assert_eq!(before.retrieval.hybrid_limit, 20);
        assert_eq!(shared.snapshot().retrieval.hybrid_limit, 50);
    }

    #[test]
    fn test_rejected_update_keeps_previous() {
        let shared = SharedConfig::default();

        let mut bad = Config::default();
        bad.query_limits.max_results = 0;
        assert!(shared.update(bad).is_err());

        assert_eq!(shared.snapshot().query_limits.max_results, 20);
    }

    #[test]
    fn test_new_rejects_invalid() {
        let mut bad = Config::default();
        bad.scoring.high_quality_threshold = 2.0;
        assert!(SharedConfig::new(bad).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedConfig::default();
        let other = shared.clone();

        let mut next = Config::default();
        next.retrieval.enable_reranker = false;
        other.update(next).unwrap();

        assert!(!shared.snapshot().retrieval.enable_reranker);
    }
}

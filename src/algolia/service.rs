//! Index service abstraction consumed by the orchestrator.

use crate::algolia::{AlgoliaService, IndexConfig, IndexError, IndexSettings};
use crate::processing::SearchableFragment;
use async_trait::async_trait;

/// Hosted search index offering settings and upsert primitives.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Apply index-level settings. Must be idempotent.
    async fn configure(&self, settings: &IndexSettings) -> Result<(), IndexError>;

    /// Add or replace `records` in one call, returning the number written.
    async fn upsert(&self, records: &[SearchableFragment]) -> Result<usize, IndexError>;
}

/// Produces a fresh [`IndexService`] bound to one invocation's configuration.
pub trait IndexConnector: Send + Sync {
    /// Open a client for the index described by `config`.
    fn connect(&self, config: &IndexConfig) -> Result<Box<dyn IndexService>, IndexError>;
}

/// Connector yielding [`AlgoliaService`] clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgoliaConnector;

impl IndexConnector for AlgoliaConnector {
    fn connect(&self, config: &IndexConfig) -> Result<Box<dyn IndexService>, IndexError> {
        Ok(Box::new(AlgoliaService::connect(config)?))
    }
}

#[async_trait]
impl IndexService for AlgoliaService {
    async fn configure(&self, settings: &IndexSettings) -> Result<(), IndexError> {
        self.set_settings(settings).await
    }

    async fn upsert(&self, records: &[SearchableFragment]) -> Result<usize, IndexError> {
        let saved = self.save_objects(records).await?;
        Ok(saved.len())
    }
}

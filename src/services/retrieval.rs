//! Retrieval stage.

use crate::Result;
use crate::models::{RetrievalResult, SynthesizedQuery};
use crate::storage::KnowledgeStore;
use std::sync::Arc;
use tracing::instrument;

/// Default number of cases retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Fetches similar prior cases for a synthesized query.
pub struct Retriever {
    store: Arc<dyn KnowledgeStore>,
    top_k: usize,
}

impl Retriever {
    /// Creates a retriever over `store` returning at most `top_k` cases.
    #[must_use]
    pub fn new(store: Arc<dyn KnowledgeStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Returns the configured result limit.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Queries the store with the synthesized search query.
    ///
    /// An empty result is normal and is logged, not returned as an error.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query itself fails.
    #[instrument(skip(self, query), fields(operation = "retrieve", store = self.store.name(), top_k = self.top_k))]
    pub fn retrieve(&self, query: &SynthesizedQuery) -> Result<RetrievalResult> {
        let records = self.store.query(&query.search_query, self.top_k)?;
        if records.is_empty() {
            tracing::info!("No similar cases found");
        } else {
            tracing::info!(count = records.len(), "Retrieved similar cases");
        }
        Ok(RetrievalResult::new(records))
    }
}

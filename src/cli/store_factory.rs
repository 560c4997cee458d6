//! Knowledge store factory for CLI commands.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::Result;
use crate::config::{StoreBackend, TriageConfig};
use crate::embedding::{Embedder, HashEmbedder, OpenAiEmbedder};
use crate::storage::{KnowledgeStore, LocalStore, PineconeStore};

use super::llm_factory::build_http_config;

/// Builds the embedder used by the Pinecone backend.
#[must_use]
pub fn build_openai_embedder(config: &TriageConfig) -> OpenAiEmbedder {
    let mut embedder = OpenAiEmbedder::new().with_dimensions(config.store.dimensions);
    if let Some(ref api_key) = config.embedding.api_key {
        embedder = embedder.with_api_key(api_key.expose_secret());
    }
    if let Some(ref model) = config.embedding.model {
        embedder = embedder.with_model(model);
    }
    if let Some(ref base_url) = config.embedding.base_url {
        embedder = embedder.with_endpoint(base_url);
    }
    embedder.with_http_config(build_http_config(&config.llm))
}

/// Builds the configured knowledge store.
///
/// The Pinecone backend embeds with `OpenAI`; the local backend uses the
/// offline hashing embedder.
///
/// # Errors
///
/// Returns an error if required credentials are missing, the Pinecone
/// index cannot be resolved, or the local index file is unreadable.
pub fn build_store(config: &TriageConfig) -> Result<Arc<dyn KnowledgeStore>> {
    match config.store.backend {
        StoreBackend::Pinecone => {
            let embedder: Arc<dyn Embedder> = Arc::new(build_openai_embedder(config));
            let store =
                PineconeStore::connect(&config.store, embedder, build_http_config(&config.llm))?;
            Ok(Arc::new(store))
        },
        StoreBackend::Local => {
            let embedder: Arc<dyn Embedder> =
                Arc::new(HashEmbedder::new(config.store.dimensions));
            let mut store = LocalStore::open(config.store.local_path(), embedder)?;
            if let Some(min_score) = config.store.min_score {
                store = store.with_min_score(min_score);
            }
            Ok(Arc::new(store))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_build_local_store() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let mut config = TriageConfig::default().with_backend(StoreBackend::Local);
        config.store.path = Some(dir.path().join("index.json"));

        let store = build_store(&config);
        assert!(store.is_ok_and(|s| s.name() == "local"));
    }

    #[test]
    fn test_build_pinecone_store_requires_key() {
        let config = TriageConfig::default();
        let result = build_store(&config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_openai_embedder_uses_index_dimensions() {
        let mut config = TriageConfig::default();
        config.store.dimensions = 256;
        assert_eq!(build_openai_embedder(&config).dimensions(), 256);
    }
}

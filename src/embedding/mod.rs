//! Embedding generation.
//!
//! Embeddings are owned by the knowledge store: callers hand it text and
//! never see vectors. Two embedders are provided, the `OpenAI` embeddings
//! API for production and a deterministic feature-hashing embedder for
//! offline runs and tests.

mod hash;
mod openai;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

use crate::Result;

/// Default embedding dimensions, matching the Pinecone index.
pub const DEFAULT_DIMENSIONS: usize = 1024;

/// Trait for embedding generators.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Computes cosine similarity between two vectors, normalized to `[0, 1]`.
///
/// Vectors of different length, or with a zero norm, score 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    f32::midpoint(dot_product / (norm_a * norm_b), 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v1, &v1) - 1.0).abs() < 0.001);

        // Orthogonal vectors land in the middle of the range
        let v2 = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) - 0.5).abs() < 0.001);

        let v3 = vec![-1.0, 0.0, 0.0];
        assert!(cosine_similarity(&v1, &v3) < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_default_embed_batch() {
        let embedder = HashEmbedder::new(16);
        let batch = embedder.embed_batch(&["one", "two"]).unwrap_or_default();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|v| v.len() == 16));
    }
}

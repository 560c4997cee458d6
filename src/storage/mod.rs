//! Knowledge store abstraction.
//!
//! A knowledge store holds [`CaseRecord`]s and answers nearest-neighbor
//! queries by text. Embedding happens inside the store.
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`PineconeStore`] | Hosted Pinecone serverless index |
//! | [`LocalStore`] | Brute-force cosine index, optionally persisted to JSON |

mod local;
mod pinecone;

pub use local::LocalStore;
pub use pinecone::PineconeStore;

use crate::Result;
use crate::models::CaseRecord;

/// Append-only vector-indexed store of error cases.
///
/// Records are never updated or deleted.
pub trait KnowledgeStore: Send + Sync {
    /// The backend name, for logging.
    fn name(&self) -> &'static str;

    /// Embeds and stores records, each under a fresh id.
    ///
    /// Returns the number of records written. An empty slice writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the write fails.
    fn upsert(&self, records: &[CaseRecord]) -> Result<usize>;

    /// Returns up to `k` records most similar to `text`, best first.
    ///
    /// An empty store yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the search request fails.
    fn query(&self, text: &str, k: usize) -> Result<Vec<CaseRecord>>;
}

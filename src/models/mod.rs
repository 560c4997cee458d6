//! Data models for errtriage.
//!
//! Everything here except [`CaseRecord`] lives for a single pipeline run.
//! Case records are the only persisted entity and are append-only.

mod case;
mod feedback;
mod report;
mod structured;

pub use case::{CaseMetadata, CaseRecord, CaseType, RetrievalResult};
pub use feedback::Feedback;
pub use report::{ErrorReport, FinalReport, InputOrigin};
pub use structured::{StructuredError, SynthesizedQuery, UNKNOWN};

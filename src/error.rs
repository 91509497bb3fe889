// Per-unit error kinds for the fingerprinting pipeline.
//
// A "unit" is one publication or one author. Unit functions return these
// typed errors; the batch drivers decide whether to log-and-continue or
// abort. Nothing here is ever silently swallowed — an unexpected fault
// surfaces as a tagged failure for its unit.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A matched surface form could not be mapped to a keyword id, even
    /// after ASCII folding. Fatal for the current document.
    #[error("keyword surface form {surface:?} has no id mapping (even after ASCII folding)")]
    LookupMiss { surface: String },

    /// A required embedding vector is absent from the reference data.
    #[error("no embedding available for {entity} {id}")]
    MissingEmbedding { entity: &'static str, id: i64 },

    /// Density clustering received a malformed or empty embedding batch.
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// A write to the store failed. Fingerprints are the system's only
    /// observable output, so these are surfaced, never swallowed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The unit exceeded its processing deadline.
    #[error("unit timed out after {0}s")]
    Timeout(u64),
}

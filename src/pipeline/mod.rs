// Batch pipeline — per-publication fingerprinting, per-author aggregation,
// and query ranking.
//
// Units (one publication or one author) read only shared immutable reference
// data and write only rows scoped to their own id, so they fan out through a
// bounded worker pool with no cross-unit contention. A failing unit is logged
// and skipped; a failure-rate circuit breaker escalates to a fatal abort when
// failures look systemic rather than incidental.

pub mod author;
pub mod publication;
pub mod ranking;

use crate::dedup::{DEDUP_EPS, DEDUP_MIN_SAMPLES};
use crate::scoring::relevance::GENERALITY_FREQ_THRESHOLD;
use crate::scoring::softmax::SOFTMAX_EXPONENT;

/// Tunable pipeline constants. Defaults reproduce the reference behavior.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Fingerprint size cap per publication
    pub max_keywords_per_publication: usize,
    /// Pre-dedup candidate pool per publication (the min(pool, n-1) rule)
    pub query_keyword_pool: usize,
    /// Final fingerprint size cap per author
    pub max_keywords_per_author: usize,
    /// Author candidates fetched before dedup
    pub author_candidate_pool: usize,
    /// Author candidates surviving dedup
    pub author_candidate_cap: usize,
    /// DBSCAN neighborhood radius for near-duplicate suppression
    pub dedup_eps: f64,
    /// DBSCAN minimum neighborhood size (point included)
    pub dedup_min_samples: usize,
    /// Background frequency at which the generality penalty applies
    pub generality_freq_threshold: u64,
    /// Softmax exponent multiplier (base = e^exponent)
    pub softmax_exponent: f64,
    /// Minimum completed units before the circuit breaker may trip
    pub breaker_min_units: usize,
    /// Failure rate above which a pass aborts
    pub breaker_max_failure_rate: f64,
    /// Per-unit processing deadline in seconds
    pub unit_timeout_secs: u64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            max_keywords_per_publication: 9,
            query_keyword_pool: 17,
            max_keywords_per_author: 17,
            author_candidate_pool: 70,
            author_candidate_cap: 40,
            dedup_eps: DEDUP_EPS,
            dedup_min_samples: DEDUP_MIN_SAMPLES,
            generality_freq_threshold: GENERALITY_FREQ_THRESHOLD,
            softmax_exponent: SOFTMAX_EXPONENT,
            breaker_min_units: 20,
            breaker_max_failure_rate: 0.5,
            unit_timeout_secs: 30,
        }
    }
}

/// Outcome counts for one batch pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub processed: usize,
    pub assigned: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Failure-rate circuit breaker.
///
/// Log-and-continue keeps a long batch job alive through incidental
/// failures, but would silently under-cover the corpus if failures were
/// systemic (say, a vocabulary/embedding mismatch). The breaker trips once
/// enough units have completed and most of them failed.
pub struct FailureTracker {
    completed: usize,
    failed: usize,
    min_units: usize,
    max_failure_rate: f64,
}

impl FailureTracker {
    pub fn new(min_units: usize, max_failure_rate: f64) -> Self {
        Self {
            completed: 0,
            failed: 0,
            min_units,
            max_failure_rate,
        }
    }

    pub fn record_success(&mut self) {
        self.completed += 1;
    }

    pub fn record_failure(&mut self) {
        self.completed += 1;
        self.failed += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// True once the observed failure rate exceeds the threshold after the
    /// minimum sample size.
    pub fn tripped(&self) -> bool {
        self.completed >= self.min_units
            && (self.failed as f64) / (self.completed as f64) > self.max_failure_rate
    }
}

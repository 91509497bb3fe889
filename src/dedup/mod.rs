// Near-duplicate keyword suppression.
//
// Candidate keywords often include several phrasings of the same concept
// ("neural network", "neural networks", "deep neural network") whose
// embeddings sit close together. DBSCAN groups those near-duplicates;
// the selection loop then walks the candidates in their existing rank order
// and keeps one representative per cluster. Because the input is sorted by
// score, first-seen-wins keeps the highest-scoring member of each group.
//
// Two merge policies cover the two call sites:
// - Drop: later cluster members are discarded (publication fingerprints).
// - SumIntoRepresentative: later members fold their score into the kept
//   representative (author fingerprints).

pub mod dbscan;

use crate::error::PipelineError;
use crate::scoring::ScoredKeyword;

/// Neighborhood radius for near-duplicate detection over keyword embeddings.
pub const DEDUP_EPS: f64 = 0.47815;
/// Minimum neighborhood size (including the point itself) for a dense region.
pub const DEDUP_MIN_SAMPLES: usize = 2;

/// What to do with a candidate whose cluster already has a kept representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Discard the candidate.
    Drop,
    /// Add the candidate's score to the representative's score.
    SumIntoRepresentative,
}

/// Suppress near-duplicate candidates, keeping at most `cap` entries.
///
/// `candidates` must be in rank order (best first); `embeddings` is parallel
/// to it. Noise points (no dense neighborhood) are always kept. Selection
/// stops once `cap` entries are kept — under `SumIntoRepresentative`, later
/// cluster members stop folding in at that point too, matching the
/// cap-check-first selection loop this mirrors.
pub fn deduplicate(
    candidates: &[ScoredKeyword],
    embeddings: &[Vec<f64>],
    policy: MergePolicy,
    cap: usize,
    eps: f64,
    min_samples: usize,
) -> Result<Vec<ScoredKeyword>, PipelineError> {
    if candidates.is_empty() {
        return Err(PipelineError::Clustering(
            "empty candidate batch".to_string(),
        ));
    }
    if candidates.len() != embeddings.len() {
        return Err(PipelineError::Clustering(format!(
            "{} candidates but {} embeddings",
            candidates.len(),
            embeddings.len()
        )));
    }

    let labels = dbscan::dbscan(embeddings, eps, min_samples);

    let mut kept: Vec<ScoredKeyword> = Vec::new();
    // cluster label -> index into `kept` of that cluster's representative
    let mut representative: std::collections::HashMap<isize, usize> =
        std::collections::HashMap::new();

    for (candidate, &label) in candidates.iter().zip(labels.iter()) {
        if kept.len() >= cap {
            break;
        }

        if label == dbscan::NOISE {
            kept.push(candidate.clone());
        } else if let Some(&rep_idx) = representative.get(&label) {
            if policy == MergePolicy::SumIntoRepresentative {
                kept[rep_idx].score += candidate.score;
            }
        } else {
            representative.insert(label, kept.len());
            kept.push(candidate.clone());
        }
    }

    Ok(kept)
}

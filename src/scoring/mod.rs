// Keyword scoring — embedding relevance and softmax-like reweighting.

pub mod relevance;
pub mod softmax;

/// A keyword candidate with its current score. Transient — flows from the
/// relevance scorer through deduplication into the persisted fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKeyword {
    pub keyword_id: i64,
    pub score: f64,
}

/// Sort candidates by score descending, breaking ties by lower keyword id,
/// and truncate to `k`. The id tie-break keeps every pass reproducible.
pub fn top_k(mut candidates: Vec<ScoredKeyword>, k: usize) -> Vec<ScoredKeyword> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.keyword_id.cmp(&b.keyword_id))
    });
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sk(id: i64, score: f64) -> ScoredKeyword {
        ScoredKeyword {
            keyword_id: id,
            score,
        }
    }

    #[test]
    fn test_top_k_orders_by_score_desc() {
        let out = top_k(vec![sk(1, 0.2), sk(2, 0.9), sk(3, 0.5)], 2);
        assert_eq!(out, vec![sk(2, 0.9), sk(3, 0.5)]);
    }

    #[test]
    fn test_top_k_tie_breaks_by_lower_id() {
        let out = top_k(vec![sk(7, 0.5), sk(3, 0.5), sk(5, 0.5)], 3);
        assert_eq!(out, vec![sk(3, 0.5), sk(5, 0.5), sk(7, 0.5)]);
    }

    #[test]
    fn test_top_k_handles_k_larger_than_input() {
        let out = top_k(vec![sk(1, 0.1)], 10);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_top_k_zero_selects_nothing() {
        let out = top_k(vec![sk(1, 0.1), sk(2, 0.2)], 0);
        assert!(out.is_empty());
    }
}

// Relevance scoring — cosine similarity with a generality penalty.
//
// Both sides of the comparison are unit vectors, so cosine similarity
// reduces to a dot product. Keywords that are frequent in the background
// (non-domain) corpus get their score divided by the square root of that
// frequency: locally similar but generic words ("system", "model") are
// softly suppressed, while keywords absent from the frequency table are
// treated as domain-specific and keep their raw score.

/// Background-corpus frequency at or above which the penalty kicks in.
pub const GENERALITY_FREQ_THRESHOLD: u64 = 1000;

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scale a vector to unit length. Returns None for a zero (or numerically
/// degenerate) vector, which has no direction to normalize.
pub fn l2_normalize(v: &[f64]) -> Option<Vec<f64>> {
    let norm = l2_norm(v);
    if norm < f64::EPSILON {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Score one matched keyword against a document.
///
/// `doc` and `keyword` must already be unit-normalized. `background_freq`
/// is the keyword's count in the background corpus, or None if the keyword
/// never appears there.
pub fn relevance_score(
    doc: &[f64],
    keyword: &[f64],
    background_freq: Option<u64>,
    freq_threshold: u64,
) -> f64 {
    let mut score = dot(doc, keyword);

    if let Some(freq) = background_freq {
        if freq >= freq_threshold {
            score /= (freq as f64).sqrt();
        }
    }

    score
}

// Softmax-like reweighting of a publication's keyword scores.
//
// Each keyword's raw relevance score s is mapped to
//     weight_i = a^(s_i) / sum_j a^(s_j),   a = e^EXPONENT
// so the top keyword of a publication dominates sharply. The base is
// expressed through its exponent multiplier: a^s = exp(EXPONENT * s).

/// Exponent multiplier controlling how sharply the top keyword dominates
/// (the softmax base is e^7).
pub const SOFTMAX_EXPONENT: f64 = 7.0;

/// Compute the normalized weights for one publication's keyword scores.
/// Returns one weight per input score; weights sum to 1 for non-empty input.
pub fn softmax_weights(scores: &[f64], exponent: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    // Shift by the max before exponentiating. Mathematically identical
    // (the shift cancels in the ratio) but keeps exp() in range.
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) * exponent).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

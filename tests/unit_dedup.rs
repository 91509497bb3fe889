// Unit tests for near-duplicate suppression over unit-vector embeddings.
//
// The #[cfg(test)] modules cover the selection loop on synthetic points;
// these tests pin down the geometry that matters in production: unit
// vectors, the production eps, and border-point absorption.

use scholarprint::dedup::dbscan::{dbscan, NOISE};
use scholarprint::dedup::{deduplicate, MergePolicy, DEDUP_EPS, DEDUP_MIN_SAMPLES};
use scholarprint::scoring::ScoredKeyword;

fn sk(id: i64, score: f64) -> ScoredKeyword {
    ScoredKeyword {
        keyword_id: id,
        score,
    }
}

/// Unit vector in 2D at the angle whose cosine is `c`.
fn unit_at_cosine(c: f64) -> Vec<f64> {
    vec![c, (1.0 - c * c).sqrt()]
}

// ============================================================
// dbscan at the production radius
// ============================================================

#[test]
fn highly_similar_unit_vectors_cluster_at_production_eps() {
    // cosine 0.95 -> chord length sqrt(2 - 2*0.95) ~= 0.316, inside eps.
    let points = vec![vec![1.0, 0.0], unit_at_cosine(0.95)];
    let labels = dbscan(&points, DEDUP_EPS, DEDUP_MIN_SAMPLES);
    assert_eq!(labels, vec![0, 0]);
}

#[test]
fn moderately_similar_unit_vectors_stay_apart_at_production_eps() {
    // cosine 0.8 -> chord length sqrt(2 - 2*0.8) ~= 0.632, outside eps.
    let points = vec![vec![1.0, 0.0], unit_at_cosine(0.8)];
    let labels = dbscan(&points, DEDUP_EPS, DEDUP_MIN_SAMPLES);
    assert_eq!(labels, vec![NOISE, NOISE]);
}

#[test]
fn border_point_is_absorbed_into_the_cluster() {
    // Points 0 and 1 are mutually close; point 2 is within eps of 1 only.
    // Point 2 has a dense-enough neighborhood through 1, so the chain
    // connects and all three share a label.
    let points = vec![vec![0.0], vec![0.3], vec![0.6]];
    let labels = dbscan(&points, DEDUP_EPS, DEDUP_MIN_SAMPLES);
    assert_eq!(labels, vec![0, 0, 0]);
}

#[test]
fn exact_duplicates_always_cluster() {
    let p = unit_at_cosine(0.5);
    let points = vec![p.clone(), p];
    let labels = dbscan(&points, DEDUP_EPS, DEDUP_MIN_SAMPLES);
    assert_eq!(labels, vec![0, 0]);
}

// ============================================================
// deduplicate — cap and policy interplay
// ============================================================

#[test]
fn sum_policy_stops_folding_once_cap_is_reached() {
    // Candidates 1 and 2 cluster; candidate 3 is noise and fills the cap
    // before 2 is reached... except 2 precedes 3 in rank order, so 2 folds
    // into 1 first and 3 is then rejected by the cap.
    let candidates = vec![sk(1, 0.9), sk(2, 0.8), sk(3, 0.1)];
    let embeddings = vec![vec![1.0, 0.0], unit_at_cosine(0.95), vec![-1.0, 0.0]];
    let out = deduplicate(
        &candidates,
        &embeddings,
        MergePolicy::SumIntoRepresentative,
        1,
        DEDUP_EPS,
        DEDUP_MIN_SAMPLES,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].keyword_id, 1);
    assert!((out[0].score - 1.7).abs() < 1e-12, "score {}", out[0].score);
}

#[test]
fn drop_policy_leaves_representative_score_untouched() {
    let candidates = vec![sk(1, 0.9), sk(2, 0.8)];
    let embeddings = vec![vec![1.0, 0.0], unit_at_cosine(0.95)];
    let out = deduplicate(
        &candidates,
        &embeddings,
        MergePolicy::Drop,
        9,
        DEDUP_EPS,
        DEDUP_MIN_SAMPLES,
    )
    .unwrap();
    assert_eq!(out, vec![sk(1, 0.9)]);
}

#[test]
fn three_way_cluster_keeps_only_the_best() {
    let candidates = vec![sk(1, 0.9), sk(2, 0.8), sk(3, 0.7), sk(4, 0.3)];
    let embeddings = vec![
        vec![1.0, 0.0],
        unit_at_cosine(0.99),
        unit_at_cosine(0.97),
        vec![0.0, 1.0],
    ];
    let out = deduplicate(
        &candidates,
        &embeddings,
        MergePolicy::Drop,
        9,
        DEDUP_EPS,
        DEDUP_MIN_SAMPLES,
    )
    .unwrap();
    assert_eq!(out, vec![sk(1, 0.9), sk(4, 0.3)]);
}

#[test]
fn sum_policy_accumulates_a_whole_cluster() {
    let candidates = vec![sk(1, 0.5), sk(2, 0.3), sk(3, 0.2)];
    let embeddings = vec![
        vec![1.0, 0.0],
        unit_at_cosine(0.99),
        unit_at_cosine(0.97),
    ];
    let out = deduplicate(
        &candidates,
        &embeddings,
        MergePolicy::SumIntoRepresentative,
        40,
        DEDUP_EPS,
        DEDUP_MIN_SAMPLES,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert!((out[0].score - 1.0).abs() < 1e-12);
}

// End-to-end pipeline tests over an in-memory store.
//
// Exercises the full sequence a real run performs: import a corpus, run the
// publication fingerprinting pass, roll fingerprints up per author, then rank
// authors against a query. Also covers loading reference data from disk.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use rusqlite::Connection;

use scholarprint::db::queries;
use scholarprint::db::schema::create_tables;
use scholarprint::matcher::CandidateMatcher;
use scholarprint::pipeline::{author, publication, ranking, PassSummary, PipelineParams};
use scholarprint::reference::{KeywordTable, ReferenceData};

// Keywords 1/2/3 sit far apart in embedding space; 4 is a near-duplicate
// of 1 so the dedup stage has something to suppress.
fn reference() -> ReferenceData {
    let keywords = KeywordTable::new(
        vec![
            (1, "graph theory".to_string(), vec![1.0, 0.0, 0.0]),
            (2, "clustering".to_string(), vec![0.0, 1.0, 0.0]),
            (3, "databases".to_string(), vec![0.0, 0.0, 1.0]),
            (4, "graph".to_string(), vec![0.98, 0.02, 0.0]),
        ],
        HashMap::new(),
        vec![
            "graph theory".to_string(),
            "clustering".to_string(),
            "databases".to_string(),
            "graph".to_string(),
        ],
    )
    .unwrap();
    let embeddings = HashMap::from([
        (100, vec![1.0, 0.2, 0.1]),
        (101, vec![0.0, 1.0, 0.0]),
    ]);
    ReferenceData::from_parts(keywords, embeddings)
}

fn seeded_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();

    let corpus = serde_json::from_str(
        r#"{
            "publications": [
                {"id": 100, "title": "Graph clustering", "abstract": "clustering over graph databases", "citation_count": 10, "year": 2020},
                {"id": 101, "title": "A note", "abstract": "a study of clustering only", "citation_count": 4, "year": 2021},
                {"id": 102, "title": "No abstract", "abstract": null, "citation_count": 1, "year": 2022}
            ],
            "authors": [
                {"id": 1, "name": "Ada"},
                {"id": 2, "name": "Grace"}
            ],
            "authorship": [
                {"publication_id": 100, "author_id": 1},
                {"publication_id": 101, "author_id": 2}
            ],
            "npmi_pairs": [
                {"id1": 5, "id2": 4, "npmi": 0.9},
                {"id1": 5, "id2": 3, "npmi": 0.2}
            ]
        }"#,
    )
    .unwrap();
    queries::import_corpus(&mut conn, &corpus).unwrap();
    conn
}

async fn run_publication_pass(conn: &mut Connection) -> PassSummary {
    let reference = Arc::new(reference());
    let matcher = Arc::new(CandidateMatcher::new(reference.keywords.vocabulary()).unwrap());
    let params = Arc::new(PipelineParams::default());
    publication::run(conn, reference, matcher, params, 4)
        .await
        .unwrap()
}

// ============================================================
// Publication pass
// ============================================================

#[tokio::test]
async fn publication_pass_fingerprints_multi_match_publications() {
    let mut conn = seeded_conn();
    let summary = run_publication_pass(&mut conn).await;

    // 102 has no abstract and never enters the pass. 101 matches a single
    // keyword and is skipped. 100 matches three keywords and is assigned.
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.assigned, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let fp = queries::get_publication_fingerprint(&conn, 100).unwrap();
    assert_eq!(fp.len(), 2, "min(17, 3-1) keywords pooled");
    // "graph" aligns best with the publication embedding.
    assert_eq!(fp[0].keyword_id, 4);

    assert!(queries::get_publication_fingerprint(&conn, 101)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn publication_pass_rerun_does_not_duplicate_rows() {
    let mut conn = seeded_conn();
    run_publication_pass(&mut conn).await;
    let first = queries::get_publication_fingerprint(&conn, 100).unwrap();
    run_publication_pass(&mut conn).await;
    let second = queries::get_publication_fingerprint(&conn, 100).unwrap();
    assert_eq!(first, second);
}

// ============================================================
// Author pass
// ============================================================

#[tokio::test]
async fn author_pass_rolls_up_citation_weighted_scores() {
    let mut conn = seeded_conn();
    run_publication_pass(&mut conn).await;

    let keywords = Arc::new(reference().keywords);
    let params = Arc::new(PipelineParams::default());
    let summary = author::run(&mut conn, keywords, params, 4).await.unwrap();

    // Ada has the only fingerprinted publication; Grace has none.
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.assigned, 1);
    assert_eq!(summary.skipped, 1);

    let fp = queries::get_author_fingerprint(&conn, 1).unwrap();
    assert_eq!(fp.len(), 2);
    // Softmax weights over one publication sum to 1, so the citation-scaled
    // scores sum to the citation count.
    let total: f64 = fp.iter().map(|r| r.score).sum();
    assert!((total - 10.0).abs() < 1e-9, "total {total}");
    assert_eq!(fp[0].keyword_id, 4, "top publication keyword dominates");

    assert!(queries::get_author_fingerprint(&conn, 2).unwrap().is_empty());
}

#[tokio::test]
async fn author_pass_rerun_reproduces_identical_fingerprints() {
    let mut conn = seeded_conn();
    run_publication_pass(&mut conn).await;

    let params = Arc::new(PipelineParams::default());
    author::run(&mut conn, Arc::new(reference().keywords), Arc::clone(&params), 4)
        .await
        .unwrap();
    let first = queries::get_author_fingerprint(&conn, 1).unwrap();

    author::run(&mut conn, Arc::new(reference().keywords), params, 4)
        .await
        .unwrap();
    let second = queries::get_author_fingerprint(&conn, 1).unwrap();

    assert_eq!(first, second, "full rewrite must be reproducible");
}

// ============================================================
// Ranking after both passes
// ============================================================

#[tokio::test]
async fn ranking_finds_authors_through_npmi_neighborhoods() {
    let mut conn = seeded_conn();
    run_publication_pass(&mut conn).await;

    // Query keyword 5 is not in any fingerprint, but its neighborhood
    // {5: 1.0, 4: 0.9, 3: 0.2} intersects publication 100's fingerprint.
    let ranked = ranking::rank_authors(&mut conn, &[5]).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].id, 1);
    assert_eq!(ranked[0].name, "Ada");
    // Best NPMI over the intersection is 0.9, times 10 citations.
    assert!((ranked[0].score - 9.0).abs() < 1e-9, "score {}", ranked[0].score);
}

#[tokio::test]
async fn ranking_before_any_fingerprinting_is_empty() {
    let mut conn = seeded_conn();
    let ranked = ranking::rank_authors(&mut conn, &[5]).unwrap();
    assert!(ranked.is_empty());
}

// ============================================================
// Reference data loading
// ============================================================

#[test]
fn reference_data_loads_from_a_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("keywords.json"),
        r#"[{"id": 1, "text": "graph theory", "embedding": [3.0, 4.0]}]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("background_freqs.json"),
        r#"{"graph theory": 4000}"#,
    )
    .unwrap();
    fs::write(dir.path().join("golden.json"), r#"["Graph Theory"]"#).unwrap();
    fs::write(
        dir.path().join("publication_embeddings.json"),
        r#"[{"id": 100, "embedding": [0.5, 0.5]}]"#,
    )
    .unwrap();

    let reference = ReferenceData::load(dir.path()).unwrap();
    assert_eq!(reference.keywords.len(), 1);
    assert_eq!(reference.keywords.vocabulary(), ["graph theory"]);
    assert_eq!(reference.keywords.background_frequency("graph theory"), Some(4000));
    assert!(reference.publication_embedding(100).is_some());
    // Embeddings are unit-normalized on load.
    let e = reference.keywords.embedding(1).unwrap();
    assert!((e[0] - 0.6).abs() < 1e-12);
    assert!((e[1] - 0.8).abs() < 1e-12);
}

#[test]
fn reference_load_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ReferenceData::load(dir.path()).is_err());
}

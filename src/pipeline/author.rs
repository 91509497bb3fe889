// Author aggregation — softmax-reweighted rollup of publication fingerprints.
//
// For each of an author's publications, the stored keyword scores are
// reweighted so the publication's top keyword dominates, then scaled by the
// publication's citation count and summed per keyword across all of the
// author's publications. The top candidates are deduplicated (scores of
// near-duplicates merge into the kept representative) and the final top
// keywords become the author's fingerprint, rewritten wholesale.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::models::{AuthorKeywordRow, FingerprintRow};
use crate::db::queries;
use crate::dedup::{deduplicate, MergePolicy};
use crate::error::PipelineError;
use crate::pipeline::{FailureTracker, PassSummary, PipelineParams};
use crate::reference::KeywordTable;
use crate::scoring::softmax::softmax_weights;
use crate::scoring::{top_k, ScoredKeyword};

/// Aggregate one author's publication-level keyword scores into a
/// fingerprint. Pure — persistence happens in the batch driver.
/// Returns None for an author with no qualifying publications.
pub fn aggregate_author(
    rows: &[AuthorKeywordRow],
    keywords: &KeywordTable,
    params: &PipelineParams,
) -> Result<Option<Vec<ScoredKeyword>>, PipelineError> {
    if rows.is_empty() {
        return Ok(None);
    }

    // Group the author's rows per publication; BTreeMap keeps the iteration
    // order deterministic.
    let mut per_publication: BTreeMap<i64, Vec<&AuthorKeywordRow>> = BTreeMap::new();
    for row in rows {
        per_publication.entry(row.publication_id).or_default().push(row);
    }

    // candidate score per keyword: sum over publications of
    // citation * softmax_weight(keyword within that publication)
    let mut candidate_scores: BTreeMap<i64, f64> = BTreeMap::new();
    for publication_rows in per_publication.values() {
        let scores: Vec<f64> = publication_rows.iter().map(|r| r.score).collect();
        let weights = softmax_weights(&scores, params.softmax_exponent);
        for (row, weight) in publication_rows.iter().zip(weights) {
            *candidate_scores.entry(row.keyword_id).or_insert(0.0) +=
                row.citation_count.max(0) as f64 * weight;
        }
    }

    let candidates: Vec<ScoredKeyword> = candidate_scores
        .into_iter()
        .map(|(keyword_id, score)| ScoredKeyword { keyword_id, score })
        .collect();
    let pooled = top_k(candidates, params.author_candidate_pool);

    let embeddings: Vec<Vec<f64>> = pooled
        .iter()
        .map(|c| {
            keywords
                .embedding(c.keyword_id)
                .map(<[f64]>::to_vec)
                .ok_or(PipelineError::MissingEmbedding {
                    entity: "keyword",
                    id: c.keyword_id,
                })
        })
        .collect::<Result<_, _>>()?;

    let merged = deduplicate(
        &pooled,
        &embeddings,
        MergePolicy::SumIntoRepresentative,
        params.author_candidate_cap,
        params.dedup_eps,
        params.dedup_min_samples,
    )?;

    Ok(Some(top_k(merged, params.max_keywords_per_author)))
}

/// Run the per-author aggregation pass over every author in the store.
///
/// Inputs are prefetched per author, computation fans out through a bounded
/// worker pool, and each completed fingerprint is rewritten in its own
/// transaction. Failures are isolated per author under the same circuit
/// breaker as the publication pass.
pub async fn run(
    conn: &mut Connection,
    keywords: Arc<KeywordTable>,
    params: Arc<PipelineParams>,
    concurrency: usize,
) -> Result<PassSummary> {
    let author_ids = queries::get_author_ids(conn)?;
    info!(count = author_ids.len(), "Starting author aggregation pass");

    let mut inputs = Vec::with_capacity(author_ids.len());
    for author_id in author_ids {
        inputs.push((author_id, queries::get_author_keyword_rows(conn, author_id)?));
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Authors [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let timeout = Duration::from_secs(params.unit_timeout_secs);
    let timeout_secs = params.unit_timeout_secs;

    let mut results = stream::iter(inputs.into_iter().map(|(author_id, rows)| {
        let keywords = Arc::clone(&keywords);
        let params = Arc::clone(&params);
        async move {
            let work = tokio::task::spawn_blocking(move || {
                aggregate_author(&rows, &keywords, &params)
            });
            let outcome = match tokio::time::timeout(timeout, work).await {
                Err(_) => Err(PipelineError::Timeout(timeout_secs)),
                Ok(Err(join_err)) => {
                    Err(PipelineError::Clustering(format!("worker panicked: {join_err}")))
                }
                Ok(Ok(result)) => result,
            };
            (author_id, outcome)
        }
    }))
    .buffer_unordered(concurrency.max(1));

    let mut summary = PassSummary::default();
    let mut tracker = FailureTracker::new(params.breaker_min_units, params.breaker_max_failure_rate);

    while let Some((author_id, outcome)) = results.next().await {
        summary.processed += 1;
        match outcome {
            Ok(Some(kept)) => {
                let rows: Vec<FingerprintRow> = kept
                    .iter()
                    .map(|k| FingerprintRow {
                        keyword_id: k.keyword_id,
                        score: k.score,
                    })
                    .collect();
                match queries::rewrite_author_fingerprint(conn, author_id, &rows) {
                    Ok(()) => {
                        debug!(author_id, keywords = rows.len(), "Author fingerprint stored");
                        summary.assigned += 1;
                        tracker.record_success();
                    }
                    Err(e) => {
                        warn!(author_id, error = %e, "Failed to persist author fingerprint");
                        summary.failed += 1;
                        tracker.record_failure();
                    }
                }
            }
            Ok(None) => {
                summary.skipped += 1;
                tracker.record_success();
            }
            Err(e) => {
                warn!(author_id, error = %e, "Failed to aggregate author, skipping");
                summary.failed += 1;
                tracker.record_failure();
            }
        }
        pb.inc(1);

        if tracker.tripped() {
            pb.finish_and_clear();
            anyhow::bail!(
                "aborting pass: {} of {} authors failed — failures look systemic",
                tracker.failed(),
                summary.processed
            );
        }
    }
    pb.finish_and_clear();

    info!(
        processed = summary.processed,
        assigned = summary.assigned,
        skipped = summary.skipped,
        failed = summary.failed,
        "Author pass complete"
    );
    Ok(summary)
}

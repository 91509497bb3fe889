// Publication fingerprinting — one publication at a time, a corpus at a batch.
//
// Per publication the stages run match → score → pool → dedup → persist.
// Zero candidate matches is a skip, not an error; a lookup miss or a
// malformed embedding fails only that publication, and the batch driver
// logs it and moves on.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::models::{FingerprintRow, Publication};
use crate::db::queries;
use crate::dedup::{deduplicate, MergePolicy};
use crate::error::PipelineError;
use crate::matcher::CandidateMatcher;
use crate::pipeline::{FailureTracker, PassSummary, PipelineParams};
use crate::reference::ReferenceData;
use crate::scoring::relevance::{l2_normalize, relevance_score};
use crate::scoring::{top_k, ScoredKeyword};

/// Compute one publication's fingerprint. Pure — persistence happens in the
/// batch driver. Returns None when the publication produces no fingerprint
/// (no matches, or too few to pool).
pub fn fingerprint_publication(
    publication: &Publication,
    matcher: &CandidateMatcher,
    reference: &ReferenceData,
    params: &PipelineParams,
) -> Result<Option<Vec<ScoredKeyword>>, PipelineError> {
    let text = publication.full_text();
    let matches = matcher.find_candidates(&text, &reference.keywords)?;
    if matches.is_empty() {
        return Ok(None);
    }

    let raw_embedding = reference
        .publication_embedding(publication.id)
        .ok_or(PipelineError::MissingEmbedding {
            entity: "publication",
            id: publication.id,
        })?;
    let doc = l2_normalize(raw_embedding).ok_or_else(|| {
        PipelineError::Clustering(format!(
            "publication {} embedding has zero norm",
            publication.id
        ))
    })?;

    let mut scored = Vec::with_capacity(matches.len());
    for m in &matches {
        let keyword_embedding =
            reference
                .keywords
                .embedding(m.keyword_id)
                .ok_or(PipelineError::MissingEmbedding {
                    entity: "keyword",
                    id: m.keyword_id,
                })?;
        let score = relevance_score(
            &doc,
            keyword_embedding,
            reference.keywords.background_frequency(&m.surface),
            params.generality_freq_threshold,
        );
        scored.push(ScoredKeyword {
            keyword_id: m.keyword_id,
            score,
        });
    }

    // Pool min(17, n_matches - 1) candidates before dedup. A single-match
    // publication pools zero keywords and yields no fingerprint.
    let pool = params.query_keyword_pool.min(scored.len().saturating_sub(1));
    if pool == 0 {
        return Ok(None);
    }
    let pooled = top_k(scored, pool);

    let embeddings: Vec<Vec<f64>> = pooled
        .iter()
        .map(|c| {
            reference
                .keywords
                .embedding(c.keyword_id)
                .map(<[f64]>::to_vec)
                .ok_or(PipelineError::MissingEmbedding {
                    entity: "keyword",
                    id: c.keyword_id,
                })
        })
        .collect::<Result<_, _>>()?;

    let kept = deduplicate(
        &pooled,
        &embeddings,
        MergePolicy::Drop,
        params.max_keywords_per_publication,
        params.dedup_eps,
        params.dedup_min_samples,
    )?;

    Ok(Some(kept))
}

/// Run the full-corpus fingerprinting pass.
///
/// Publications fan out through a bounded worker pool; fingerprint rows are
/// written sequentially as units complete, which bounds memory to the
/// in-flight window. A unit failure is logged and skipped unless the
/// failure-rate breaker trips.
pub async fn run(
    conn: &mut Connection,
    reference: Arc<ReferenceData>,
    matcher: Arc<CandidateMatcher>,
    params: Arc<PipelineParams>,
    concurrency: usize,
) -> Result<PassSummary> {
    let publications = queries::get_publications_with_abstracts(conn)?;
    info!(count = publications.len(), "Starting publication fingerprinting pass");

    let pb = ProgressBar::new(publications.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Publications [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let timeout = Duration::from_secs(params.unit_timeout_secs);
    let timeout_secs = params.unit_timeout_secs;

    let mut results = stream::iter(publications.into_iter().map(|publication| {
        let reference = Arc::clone(&reference);
        let matcher = Arc::clone(&matcher);
        let params = Arc::clone(&params);
        async move {
            let id = publication.id;
            let work = tokio::task::spawn_blocking(move || {
                fingerprint_publication(&publication, &matcher, &reference, &params)
            });
            let outcome = match tokio::time::timeout(timeout, work).await {
                Err(_) => Err(PipelineError::Timeout(timeout_secs)),
                Ok(Err(join_err)) => {
                    Err(PipelineError::Clustering(format!("worker panicked: {join_err}")))
                }
                Ok(Ok(result)) => result,
            };
            (id, outcome)
        }
    }))
    .buffer_unordered(concurrency.max(1));

    let mut summary = PassSummary::default();
    let mut tracker = FailureTracker::new(params.breaker_min_units, params.breaker_max_failure_rate);

    while let Some((publication_id, outcome)) = results.next().await {
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
                match queries::upsert_publication_fingerprint(conn, publication_id, &rows) {
                    Ok(()) => {
                        debug!(publication_id, keywords = rows.len(), "Fingerprint stored");
                        summary.assigned += 1;
                        tracker.record_success();
                    }
                    Err(e) => {
                        warn!(publication_id, error = %e, "Failed to persist fingerprint");
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
                warn!(publication_id, error = %e, "Failed to fingerprint publication, skipping");
                summary.failed += 1;
                tracker.record_failure();
            }
        }
        pb.inc(1);

        if tracker.tripped() {
            pb.finish_and_clear();
            anyhow::bail!(
                "aborting pass: {} of {} publications failed — failures look systemic",
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
        "Publication pass complete"
    );
    Ok(summary)
}

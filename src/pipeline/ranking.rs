// Query ranking — match query keywords against stored fingerprints.
//
// Each query keyword "votes" for authors whose publications were assigned
// semantically related keywords, weighted by co-occurrence strength (NPMI)
// and citation impact:
//   1. expand each query keyword to its top-NPMI neighborhood (plus itself),
//   2. per (author, publication, query keyword): the best NPMI between the
//      neighborhood and the publication's fingerprint, times citations,
//   3. sum per author across publications and query keywords,
//   4. return the top authors.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::models::RankedAuthor;
use crate::db::queries;

/// How many NPMI neighbors each query keyword expands to (plus the
/// identity pair, so at most 11 rows per parent).
pub const NEIGHBORS_PER_KEYWORD: usize = 10;

/// How many authors a ranking query returns.
pub const MAX_RANKED_AUTHORS: usize = 15;

/// Per-parent neighborhood: keyword id -> NPMI.
type NeighborMap = HashMap<i64, HashMap<i64, f64>>;

/// Build the neighbor table for the query set and persist it to the derived
/// `neighbor_table` relation. Every parent gets its top neighbors by NPMI
/// descending (ties broken by lower keyword id) plus an identity row at 1.0.
pub fn build_neighbor_table(conn: &mut Connection, query_ids: &[i64]) -> Result<NeighborMap> {
    // Deduplicate while keeping a deterministic order.
    let parents: BTreeSet<i64> = query_ids.iter().copied().collect();

    let mut neighbor_map: NeighborMap = HashMap::new();
    let mut table_rows: Vec<(i64, i64, f64)> = Vec::new();

    for &parent in &parents {
        let mut partners = queries::get_npmi_neighbors(conn, parent)?;
        partners.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        partners.truncate(NEIGHBORS_PER_KEYWORD);

        let entry = neighbor_map.entry(parent).or_default();
        for (keyword_id, npmi) in partners {
            entry.insert(keyword_id, npmi);
            table_rows.push((parent, keyword_id, npmi));
        }
        // Identity pair: the query keyword itself, at full similarity.
        entry.insert(parent, 1.0);
        table_rows.push((parent, parent, 1.0));
    }

    queries::replace_neighbor_table(conn, &table_rows)?;
    debug!(parents = parents.len(), rows = table_rows.len(), "Neighbor table rebuilt");

    Ok(neighbor_map)
}

/// Rank authors against a query keyword set.
///
/// Returns at most `MAX_RANKED_AUTHORS` authors, descending by score, ties
/// broken by lower author id. A query whose neighborhoods intersect no
/// stored fingerprint returns an empty list.
pub fn rank_authors(conn: &mut Connection, query_ids: &[i64]) -> Result<Vec<RankedAuthor>> {
    if query_ids.is_empty() {
        return Ok(Vec::new());
    }

    let neighbor_map = build_neighbor_table(conn, query_ids)?;
    let ranking_rows = queries::get_ranking_rows(conn)?;

    // Group fingerprint keywords per (author, publication). Rows come
    // ordered, so consecutive rows share the group key.
    let mut totals: HashMap<i64, f64> = HashMap::new();
    let mut group: Option<(i64, i64, i64, Vec<i64>)> = None;

    let flush = |group: &Option<(i64, i64, i64, Vec<i64>)>, totals: &mut HashMap<i64, f64>| {
        let Some((author_id, _publication_id, citations, keyword_ids)) = group else {
            return;
        };
        for neighborhood in neighbor_map.values() {
            // Best NPMI between this parent's neighborhood and the
            // publication's assigned keywords.
            let best = keyword_ids
                .iter()
                .filter_map(|kw| neighborhood.get(kw).copied())
                .fold(None, |acc: Option<f64>, npmi| {
                    Some(acc.map_or(npmi, |a| a.max(npmi)))
                });
            if let Some(max_npmi) = best {
                *totals.entry(*author_id).or_insert(0.0) += max_npmi * *citations as f64;
            }
        }
    };

    for row in &ranking_rows {
        match &mut group {
            Some((author_id, publication_id, _, keyword_ids))
                if *author_id == row.author_id && *publication_id == row.publication_id =>
            {
                keyword_ids.push(row.keyword_id);
            }
            _ => {
                flush(&group, &mut totals);
                group = Some((
                    row.author_id,
                    row.publication_id,
                    row.citation_count,
                    vec![row.keyword_id],
                ));
            }
        }
    }
    flush(&group, &mut totals);

    let mut ranked: Vec<(i64, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(MAX_RANKED_AUTHORS);

    let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
    let names = queries::get_author_names(conn, &ids)?;

    let authors: Vec<RankedAuthor> = ranked
        .into_iter()
        .map(|(id, score)| RankedAuthor {
            id,
            name: names.get(&id).cloned().unwrap_or_default(),
            score,
        })
        .collect();

    info!(query_keywords = query_ids.len(), authors = authors.len(), "Ranking complete");
    Ok(authors)
}

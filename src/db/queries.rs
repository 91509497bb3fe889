// Database queries — all SQL lives here.
//
// Free functions over an explicit `Connection` handle: every component
// receives the store it writes to, and each unit of work (one publication,
// one author) is one transaction.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{params, Connection};

use super::models::{
    Author, AuthorKeywordRow, CorpusFile, FingerprintRow, Publication, RankingRow,
};

// --- Corpus import ---

/// Load a corpus file into the store in a single transaction.
/// Upserts throughout, so re-importing the same file is harmless.
pub fn import_corpus(conn: &mut Connection, corpus: &CorpusFile) -> Result<()> {
    let tx = conn.transaction()?;

    for p in &corpus.publications {
        tx.execute(
            "INSERT INTO publication (id, title, abstract, citation_count, year)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = ?2, abstract = ?3, citation_count = ?4, year = ?5",
            params![p.id, p.title, p.abstract_text, p.citation_count, p.year],
        )?;
    }

    for a in &corpus.authors {
        tx.execute(
            "INSERT INTO author (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = ?2",
            params![a.id, a.name],
        )?;
    }

    for link in &corpus.authorship {
        tx.execute(
            "INSERT OR IGNORE INTO publication_author (publication_id, author_id)
             VALUES (?1, ?2)",
            params![link.publication_id, link.author_id],
        )?;
    }

    for pair in &corpus.npmi_pairs {
        tx.execute(
            "INSERT INTO keyword_npmi (id1, id2, npmi) VALUES (?1, ?2, ?3)
             ON CONFLICT(id1, id2) DO UPDATE SET npmi = ?3",
            params![pair.id1, pair.id2, pair.npmi],
        )?;
    }

    tx.commit()?;
    Ok(())
}

// --- Publications ---

/// All publications with a non-NULL abstract — the fingerprinting corpus.
pub fn get_publications_with_abstracts(conn: &Connection) -> Result<Vec<Publication>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, abstract, citation_count, year
         FROM publication
         WHERE abstract IS NOT NULL
         ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Publication {
            id: row.get(0)?,
            title: row.get(1)?,
            abstract_text: row.get(2)?,
            citation_count: row.get(3)?,
            year: row.get(4)?,
        })
    })?;

    let mut publications = Vec::new();
    for row in rows {
        publications.push(row?);
    }
    Ok(publications)
}

// --- Publication fingerprints ---

/// Persist one publication's fingerprint. Upsert keyed by
/// (publication_id, keyword_id): re-running the corpus pass updates scores
/// in place instead of duplicating rows.
pub fn upsert_publication_fingerprint(
    conn: &mut Connection,
    publication_id: i64,
    rows: &[FingerprintRow],
) -> Result<()> {
    let tx = conn.transaction()?;
    for row in rows {
        tx.execute(
            "INSERT INTO publication_fingerprint (publication_id, keyword_id, score)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(publication_id, keyword_id) DO UPDATE SET score = ?3",
            params![publication_id, row.keyword_id, row.score],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_publication_fingerprint(
    conn: &Connection,
    publication_id: i64,
) -> Result<Vec<FingerprintRow>> {
    let mut stmt = conn.prepare(
        "SELECT keyword_id, score FROM publication_fingerprint
         WHERE publication_id = ?1
         ORDER BY score DESC, keyword_id",
    )?;
    let rows = stmt.query_map(params![publication_id], |row| {
        Ok(FingerprintRow {
            keyword_id: row.get(0)?,
            score: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- Authors and aggregation inputs ---

pub fn get_author_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM author ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn get_author(conn: &Connection, author_id: i64) -> Result<Option<Author>> {
    use rusqlite::OptionalExtension;
    let mut stmt = conn.prepare("SELECT id, name FROM author WHERE id = ?1")?;
    let author = stmt
        .query_row(params![author_id], |row| {
            Ok(Author {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?;
    Ok(author)
}

/// Every (publication, keyword, score, citation) tuple feeding one author's
/// aggregation. Unknown citation counts read as 0.
pub fn get_author_keyword_rows(
    conn: &Connection,
    author_id: i64,
) -> Result<Vec<AuthorKeywordRow>> {
    let mut stmt = conn.prepare(
        "SELECT pf.publication_id, pf.keyword_id, pf.score, IFNULL(p.citation_count, 0)
         FROM publication_fingerprint pf
         JOIN publication_author pa ON pa.publication_id = pf.publication_id
         JOIN publication p ON p.id = pf.publication_id
         WHERE pa.author_id = ?1
         ORDER BY pf.publication_id, pf.keyword_id",
    )?;
    let rows = stmt.query_map(params![author_id], |row| {
        Ok(AuthorKeywordRow {
            publication_id: row.get(0)?,
            keyword_id: row.get(1)?,
            score: row.get(2)?,
            citation_count: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Replace an author's fingerprint wholesale. One transaction: DELETE then
/// INSERT, so re-running aggregation with unchanged inputs reproduces the
/// identical fingerprint instead of accumulating rows.
pub fn rewrite_author_fingerprint(
    conn: &mut Connection,
    author_id: i64,
    rows: &[FingerprintRow],
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM author_fingerprint WHERE author_id = ?1",
        params![author_id],
    )?;
    for row in rows {
        tx.execute(
            "INSERT INTO author_fingerprint (author_id, keyword_id, score)
             VALUES (?1, ?2, ?3)",
            params![author_id, row.keyword_id, row.score],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_author_fingerprint(conn: &Connection, author_id: i64) -> Result<Vec<FingerprintRow>> {
    let mut stmt = conn.prepare(
        "SELECT keyword_id, score FROM author_fingerprint
         WHERE author_id = ?1
         ORDER BY score DESC, keyword_id",
    )?;
    let rows = stmt.query_map(params![author_id], |row| {
        Ok(FingerprintRow {
            keyword_id: row.get(0)?,
            score: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- NPMI neighbors ---

/// All NPMI partners of a keyword, read from both sides of the symmetric
/// pair relation.
pub fn get_npmi_neighbors(conn: &Connection, keyword_id: i64) -> Result<Vec<(i64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT id2, npmi FROM keyword_npmi WHERE id1 = ?1
         UNION ALL
         SELECT id1, npmi FROM keyword_npmi WHERE id2 = ?1",
    )?;
    let rows = stmt.query_map(params![keyword_id], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Rebuild the derived neighbor table for the current ranking query.
pub fn replace_neighbor_table(
    conn: &mut Connection,
    rows: &[(i64, i64, f64)],
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM neighbor_table", [])?;
    for (parent_id, keyword_id, npmi) in rows {
        tx.execute(
            "INSERT INTO neighbor_table (parent_id, keyword_id, npmi) VALUES (?1, ?2, ?3)
             ON CONFLICT(parent_id, keyword_id) DO UPDATE SET npmi = MAX(npmi, ?3)",
            params![parent_id, keyword_id, npmi],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// --- Ranking inputs ---

/// Every (author, publication, fingerprint keyword, citation) tuple in the
/// store — the raw material the query ranker scans.
pub fn get_ranking_rows(conn: &Connection) -> Result<Vec<RankingRow>> {
    let mut stmt = conn.prepare(
        "SELECT pa.author_id, pf.publication_id, pf.keyword_id, IFNULL(p.citation_count, 0)
         FROM publication_fingerprint pf
         JOIN publication_author pa ON pa.publication_id = pf.publication_id
         JOIN publication p ON p.id = pf.publication_id
         ORDER BY pa.author_id, pf.publication_id, pf.keyword_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RankingRow {
            author_id: row.get(0)?,
            publication_id: row.get(1)?,
            keyword_id: row.get(2)?,
            citation_count: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- Status ---

/// Row counts shown by the `status` command.
#[derive(Debug, Default)]
pub struct StoreStats {
    pub publications: i64,
    pub publications_with_abstract: i64,
    pub fingerprinted_publications: i64,
    pub authors: i64,
    pub fingerprinted_authors: i64,
    pub npmi_pairs: i64,
}

pub fn get_store_stats(conn: &Connection) -> Result<StoreStats> {
    let scalar = |sql: &str| -> Result<i64> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };

    Ok(StoreStats {
        publications: scalar("SELECT COUNT(*) FROM publication")?,
        publications_with_abstract: scalar(
            "SELECT COUNT(*) FROM publication WHERE abstract IS NOT NULL",
        )?,
        fingerprinted_publications: scalar(
            "SELECT COUNT(DISTINCT publication_id) FROM publication_fingerprint",
        )?,
        authors: scalar("SELECT COUNT(*) FROM author")?,
        fingerprinted_authors: scalar(
            "SELECT COUNT(DISTINCT author_id) FROM author_fingerprint",
        )?,
        npmi_pairs: scalar("SELECT COUNT(*) FROM keyword_npmi")?,
    })
}

/// Map author ids to names (for rendering ranked results).
pub fn get_author_names(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, String>> {
    let mut names = HashMap::with_capacity(ids.len());
    for &id in ids {
        if let Some(author) = get_author(conn, id)? {
            names.insert(id, author.name);
        }
    }
    Ok(names)
}

// Database schema — table creation and migrations.
//
// Version-based migrations: a `schema_version` table tracks which migrations
// have run, and each migration is a function that executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Bibliographic snapshot (imported, read-mostly)
        CREATE TABLE IF NOT EXISTS publication (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            abstract TEXT,                     -- NULL abstracts are skipped by the pipeline
            citation_count INTEGER,            -- NULL means unknown, coalesced to 0
            year INTEGER
        );

        CREATE TABLE IF NOT EXISTS author (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS publication_author (
            publication_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            PRIMARY KEY (publication_id, author_id)
        );

        -- Precomputed pairwise keyword co-occurrence strength (symmetric)
        CREATE TABLE IF NOT EXISTS keyword_npmi (
            id1 INTEGER NOT NULL,
            id2 INTEGER NOT NULL,
            npmi REAL NOT NULL,
            PRIMARY KEY (id1, id2)
        );

        -- Publication fingerprints: up to 9 (keyword, score) rows per publication.
        -- Keyed by (publication_id, keyword_id) so the corpus pass is re-runnable.
        CREATE TABLE IF NOT EXISTS publication_fingerprint (
            publication_id INTEGER NOT NULL,
            keyword_id INTEGER NOT NULL,
            score REAL NOT NULL,
            PRIMARY KEY (publication_id, keyword_id)
        );

        -- Author fingerprints: fully rewritten per author on each aggregation run.
        CREATE TABLE IF NOT EXISTS author_fingerprint (
            author_id INTEGER NOT NULL,
            keyword_id INTEGER NOT NULL,
            score REAL NOT NULL,
            PRIMARY KEY (author_id, keyword_id)
        );

        -- Derived per-query neighbor table: top-NPMI neighbors per query keyword,
        -- including the identity row (parent_id, parent_id, 1.0). Rebuilt by
        -- every ranking query.
        CREATE TABLE IF NOT EXISTS neighbor_table (
            parent_id INTEGER NOT NULL,
            keyword_id INTEGER NOT NULL,
            npmi REAL NOT NULL,
            PRIMARY KEY (parent_id, keyword_id)
        );

        -- Authorship lookups by author during aggregation and ranking
        CREATE INDEX IF NOT EXISTS idx_publication_author_author
            ON publication_author(author_id);

        -- Fingerprint lookups by keyword during ranking
        CREATE INDEX IF NOT EXISTS idx_publication_fingerprint_keyword
            ON publication_fingerprint(keyword_id);

        -- NPMI pair lookups from either side of the symmetric relation
        CREATE INDEX IF NOT EXISTS idx_keyword_npmi_id2
            ON keyword_npmi(id2);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// Row types shared between the queries module and the pipeline.

use serde::{Deserialize, Serialize};

/// A publication as stored in the `publication` table. The embedding is not
/// here — it lives in the reference data, produced by an external provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub citation_count: Option<i64>,
    #[serde(default)]
    pub year: Option<i64>,
}

impl Publication {
    /// The text the candidate matcher scans: title and abstract joined.
    pub fn full_text(&self) -> String {
        match &self.abstract_text {
            Some(abstract_text) => format!("{}. {}", self.title, abstract_text),
            None => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// One (publication, author) authorship link.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorshipLink {
    pub publication_id: i64,
    pub author_id: i64,
}

/// One pairwise NPMI row from the precomputed co-occurrence table.
#[derive(Debug, Clone, Deserialize)]
pub struct NpmiPair {
    pub id1: i64,
    pub id2: i64,
    pub npmi: f64,
}

/// The corpus import file: publications, authors, links, and NPMI pairs.
#[derive(Debug, Deserialize)]
pub struct CorpusFile {
    pub publications: Vec<Publication>,
    pub authors: Vec<Author>,
    pub authorship: Vec<AuthorshipLink>,
    #[serde(default)]
    pub npmi_pairs: Vec<NpmiPair>,
}

/// One persisted fingerprint row (keyword, score) for a publication or author.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintRow {
    pub keyword_id: i64,
    pub score: f64,
}

/// One input tuple for author aggregation: a keyword score from one of the
/// author's publications, with that publication's citation count
/// (NULL coalesced to 0 at read time).
#[derive(Debug, Clone)]
pub struct AuthorKeywordRow {
    pub publication_id: i64,
    pub keyword_id: i64,
    pub score: f64,
    pub citation_count: i64,
}

/// One input tuple for query ranking: a fingerprint keyword of one of an
/// author's publications, with the publication's citation count.
#[derive(Debug, Clone)]
pub struct RankingRow {
    pub author_id: i64,
    pub publication_id: i64,
    pub keyword_id: i64,
    pub citation_count: i64,
}

/// A ranked author returned by the query ranker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAuthor {
    pub id: i64,
    pub name: String,
    pub score: f64,
}

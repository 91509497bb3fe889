// Read-only reference data, loaded once at startup.
//
// Four JSON files live in the data directory:
//   keywords.json                — [{id, text, embedding}]
//   background_freqs.json        — {keyword text: count in the background corpus}
//   golden.json                  — curated allowlist of match-vocabulary surface forms
//   publication_embeddings.json  — [{id, embedding}] keyed by publication id
//
// Keyword embeddings are L2-normalized here; every downstream cosine
// computation relies on them being unit vectors. Publication embeddings are
// normalized at scoring time instead, since they arrive from an external
// embedding provider with arbitrary magnitude.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::error::PipelineError;
use crate::scoring::relevance::l2_normalize;

#[derive(Debug, Deserialize)]
struct KeywordRecord {
    id: i64,
    text: String,
    embedding: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct PublicationEmbeddingRecord {
    id: i64,
    embedding: Vec<f64>,
}

/// The keyword vocabulary: ids, surface forms, unit embeddings, and
/// background-corpus frequencies. Immutable for the process lifetime.
pub struct KeywordTable {
    embeddings: HashMap<i64, Vec<f64>>,
    texts: HashMap<i64, String>,
    id_by_text: HashMap<String, i64>,
    background_freq: HashMap<String, u64>,
    vocabulary: Vec<String>,
}

impl KeywordTable {
    /// Build the table from already-parsed records. Embeddings are
    /// normalized to unit length; a zero-norm embedding is rejected.
    pub fn new(
        records: Vec<(i64, String, Vec<f64>)>,
        background_freq: HashMap<String, u64>,
        golden: Vec<String>,
    ) -> Result<Self> {
        let mut embeddings = HashMap::with_capacity(records.len());
        let mut texts = HashMap::with_capacity(records.len());
        let mut id_by_text = HashMap::with_capacity(records.len());

        for (id, text, embedding) in records {
            let unit = l2_normalize(&embedding)
                .with_context(|| format!("keyword {id} ({text:?}) has a zero-norm embedding"))?;
            id_by_text.insert(text.to_lowercase(), id);
            texts.insert(id, text);
            embeddings.insert(id, unit);
        }

        let vocabulary: Vec<String> = golden.into_iter().map(|w| w.to_lowercase()).collect();

        Ok(Self {
            embeddings,
            texts,
            id_by_text,
            background_freq,
            vocabulary,
        })
    }

    /// The golden-allowlist surface forms used as the match vocabulary.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Unit embedding for a keyword id.
    pub fn embedding(&self, id: i64) -> Option<&[f64]> {
        self.embeddings.get(&id).map(Vec::as_slice)
    }

    /// Surface text for a keyword id.
    pub fn text(&self, id: i64) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    /// Background-corpus frequency for a keyword surface form.
    pub fn background_frequency(&self, surface: &str) -> Option<u64> {
        self.background_freq.get(surface).copied()
    }

    /// Map a surface form to its keyword id.
    ///
    /// Non-ASCII surface forms whose literal text is missing from the id
    /// mapping are retried with an ASCII-folded form; a second miss is a
    /// fatal lookup error for the current document.
    pub fn lookup_id(&self, surface: &str) -> Result<i64, PipelineError> {
        if let Some(&id) = self.id_by_text.get(surface) {
            return Ok(id);
        }
        let folded = deunicode::deunicode(surface);
        if let Some(&id) = self.id_by_text.get(folded.as_str()) {
            return Ok(id);
        }
        Err(PipelineError::LookupMiss {
            surface: surface.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Everything the pipeline reads but never writes: the keyword table and
/// the externally produced publication embeddings.
pub struct ReferenceData {
    pub keywords: KeywordTable,
    publication_embeddings: HashMap<i64, Vec<f64>>,
}

impl ReferenceData {
    /// Load all reference files from the data directory.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let records: Vec<KeywordRecord> =
            read_json(&data_dir.join("keywords.json")).context("loading keyword vocabulary")?;
        let background_freq: HashMap<String, u64> =
            read_json(&data_dir.join("background_freqs.json"))
                .context("loading background frequencies")?;
        let golden: Vec<String> =
            read_json(&data_dir.join("golden.json")).context("loading golden allowlist")?;
        let pub_records: Vec<PublicationEmbeddingRecord> =
            read_json(&data_dir.join("publication_embeddings.json"))
                .context("loading publication embeddings")?;

        let keywords = KeywordTable::new(
            records.into_iter().map(|r| (r.id, r.text, r.embedding)).collect(),
            background_freq,
            golden,
        )?;

        let publication_embeddings: HashMap<i64, Vec<f64>> = pub_records
            .into_iter()
            .map(|r| (r.id, r.embedding))
            .collect();

        info!(
            keywords = keywords.len(),
            vocabulary = keywords.vocabulary().len(),
            publication_embeddings = publication_embeddings.len(),
            "Reference data loaded"
        );

        Ok(Self {
            keywords,
            publication_embeddings,
        })
    }

    /// Build reference data in memory — used by tests.
    pub fn from_parts(
        keywords: KeywordTable,
        publication_embeddings: HashMap<i64, Vec<f64>>,
    ) -> Self {
        Self {
            keywords,
            publication_embeddings,
        }
    }

    /// Raw (not yet normalized) embedding for a publication.
    pub fn publication_embedding(&self, id: i64) -> Option<&[f64]> {
        self.publication_embeddings.get(&id).map(Vec::as_slice)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

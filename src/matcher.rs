// Candidate keyword matching — multi-pattern substring scan.
//
// The vocabulary holds tens of thousands of multi-word phrases, so matching
// runs through an Aho-Corasick automaton: one pass over the document,
// cost roughly proportional to document length regardless of vocabulary
// size. Overlapping matches are reported ("graph" and "graph theory" both
// fire on "graph theory"), and each keyword is reported once per document
// at its first occurrence.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use anyhow::{Context, Result};

use crate::error::PipelineError;
use crate::reference::KeywordTable;

/// One vocabulary keyword found in a document. Transient — consumed
/// immediately by the relevance scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub keyword_id: i64,
    pub surface: String,
    pub position: usize,
}

/// Multi-pattern matcher over the golden keyword vocabulary.
pub struct CandidateMatcher {
    automaton: AhoCorasick,
    patterns: Vec<String>,
}

impl CandidateMatcher {
    /// Build the automaton from the vocabulary surface forms
    /// (already lowercased by the keyword table).
    pub fn new(vocabulary: &[String]) -> Result<Self> {
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(vocabulary)
            .context("building keyword automaton")?;
        Ok(Self {
            automaton,
            patterns: vocabulary.to_vec(),
        })
    }

    /// Scan a document and return every distinct vocabulary keyword it
    /// contains, each at its first occurrence.
    ///
    /// A surface form that cannot be mapped to a keyword id (even after
    /// ASCII folding) fails the whole document with `LookupMiss` — a miss
    /// means the vocabulary and id mapping have drifted apart, which must
    /// not be silently dropped.
    pub fn find_candidates(
        &self,
        text: &str,
        table: &KeywordTable,
    ) -> Result<Vec<KeywordMatch>, PipelineError> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut matches = Vec::new();

        for m in self.automaton.find_overlapping_iter(text) {
            let pattern = m.pattern().as_usize();
            if !seen.insert(pattern) {
                continue;
            }
            let surface = &self.patterns[pattern];
            let keyword_id = table.lookup_id(surface)?;
            matches.push(KeywordMatch {
                keyword_id,
                surface: surface.clone(),
                position: m.start(),
            });
        }

        Ok(matches)
    }
}

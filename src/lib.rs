// Scholarprint: topical keyword fingerprints for scholarly publications
// and authors, and author ranking against keyword queries.
//
// This is the library root. Each module corresponds to a stage of the
// assignment-and-ranking pipeline.

pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod scoring;

// Terminal rendering for ranked authors and pass summaries.

pub mod terminal;

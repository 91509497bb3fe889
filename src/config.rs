use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Central configuration loaded from environment variables.
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// SQLite database path
    pub db_path: String,
    /// Directory holding the reference data files (keyword vocabulary and
    /// embeddings, background frequencies, golden allowlist, publication
    /// embeddings)
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables. Both values have
    /// defaults, so `init` and `status` work out of the box.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("SCHOLARPRINT_DB_PATH")
                .unwrap_or_else(|_| "./scholarprint.db".to_string()),
            data_dir: env::var("SCHOLARPRINT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
        })
    }

    /// Check that the reference data directory exists.
    /// Call this before any operation that loads reference data.
    pub fn require_data_dir(&self) -> Result<()> {
        if !self.data_dir.is_dir() {
            anyhow::bail!(
                "Reference data directory not found: {}\n\
                 Set SCHOLARPRINT_DATA_DIR or create ./data with keywords.json,\n\
                 background_freqs.json, golden.json, and publication_embeddings.json.",
                self.data_dir.display()
            );
        }
        Ok(())
    }
}

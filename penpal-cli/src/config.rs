//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use penpal_core::{LetterCache, SqliteStore};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for storage.
    pub data_dir: PathBuf,
    /// Public key of the signed-in identity, if any.
    pub identity: Option<String>,
}

impl CliConfig {
    /// Builds the configuration, falling back to the platform data dir.
    pub fn new(data_dir: Option<PathBuf>, identity: Option<String>) -> Self {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("penpal")
        });
        let identity = identity.filter(|id| !id.trim().is_empty());

        CliConfig { data_dir, identity }
    }

    /// Returns the letter cache database path.
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("letters.db")
    }

    /// Opens the letter cache scoped to the configured identity.
    pub fn open_cache(&self) -> Result<LetterCache<SqliteStore>> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data dir {:?}", self.data_dir))?;
        let store = SqliteStore::open(self.cache_path())?;
        Ok(LetterCache::for_identity(store, self.identity.as_deref()))
    }

    /// Label for the active cache scope.
    pub fn scope_label(&self) -> &str {
        self.identity.as_deref().unwrap_or("anonymous")
    }
}

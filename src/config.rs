//! Configuration for the HSK trainer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Emails granted the admin role, matched exactly (case-sensitive).
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the vocabulary database location.
    #[serde(default)]
    pub vocab_db: Option<PathBuf>,
    /// Overrides the accounts database location.
    #[serde(default)]
    pub accounts_db: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "hsk-trainer")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Vocabulary database location: configured override, else the
    /// platform data directory, else the working directory.
    pub fn vocab_db_path(&self) -> PathBuf {
        self.storage
            .vocab_db
            .clone()
            .or_else(|| data_dir().map(|d| d.join("vocab.db")))
            .unwrap_or_else(|| PathBuf::from("vocab.db"))
    }

    /// Accounts database location, resolved the same way.
    pub fn accounts_db_path(&self) -> PathBuf {
        self.storage
            .accounts_db
            .clone()
            .or_else(|| data_dir().map(|d| d.join("accounts.db")))
            .unwrap_or_else(|| PathBuf::from("accounts.db"))
    }
}

fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hsk-trainer").map(|d| d.data_dir().to_path_buf())
}

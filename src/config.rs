use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};
use crate::propagate::ConflictPolicy;

/// Directory holding config, database and lock file, relative to the repo root.
pub const DIR_NAME: &str = ".taskchain";
pub const CONFIG_FILE: &str = "config.json";
pub const DATABASE_FILE: &str = "tasks.db";
pub const LOCK_FILE: &str = "write.lock";

/// Overrides the database location when set.
pub const DB_ENV: &str = "TASKCHAIN_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl Config {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Err(ChainError::NotInitialized);
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

pub fn database_path(dir: &Path) -> PathBuf {
    match std::env::var_os(DB_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dir.join(DATABASE_FILE),
    }
}

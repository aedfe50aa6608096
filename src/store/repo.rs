use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{self, Config};
use crate::error::{ChainError, Result};
use crate::propagate::{ConflictPolicy, Propagator};
use crate::store::db::SqliteStore;
use crate::store::lock::WriteLock;
use crate::store::tasklist::TaskList;

/// An opened `.taskchain` directory with its task list fetched.
pub struct Repo {
    pub config: Config,
    pub tasks: TaskList<SqliteStore>,
    _lock: Option<WriteLock>,
}

impl Repo {
    /// Create the `.taskchain` directory, its config and an empty database.
    pub fn init(repo_root: &Path) -> Result<PathBuf> {
        let root = repo_root.join(config::DIR_NAME);
        if root.join(config::CONFIG_FILE).exists() {
            return Err(ChainError::AlreadyInitialized);
        }
        fs::create_dir_all(&root)?;
        Config::default().save(&root)?;
        SqliteStore::open(&config::database_path(&root))?;
        Ok(root)
    }

    /// Open for reading. `policy` overrides the configured conflict policy.
    pub fn open(repo_root: &Path, policy: Option<ConflictPolicy>) -> Result<Self> {
        Self::open_inner(repo_root, policy, false)
    }

    /// Open holding the write lock until the repo is dropped, so the fetch,
    /// plan and commit of one command see no interleaved writer.
    pub fn open_locked(repo_root: &Path, policy: Option<ConflictPolicy>) -> Result<Self> {
        Self::open_inner(repo_root, policy, true)
    }

    fn open_inner(repo_root: &Path, policy: Option<ConflictPolicy>, lock: bool) -> Result<Self> {
        let root = repo_root.join(config::DIR_NAME);
        let config = Config::load(&root)?;
        let lock = if lock {
            Some(WriteLock::acquire(&root.join(config::LOCK_FILE))?)
        } else {
            None
        };

        let db_path = config::database_path(&root);
        let store = SqliteStore::open(&db_path)?;
        let policy = policy.unwrap_or(config.conflict_policy);
        let mut tasks = TaskList::new(store, Propagator::new(policy));
        tasks.fetch()?;
        debug!(db = %db_path.display(), %policy, "opened repository");

        Ok(Self {
            config,
            tasks,
            _lock: lock,
        })
    }
}

/// Walk up from the current directory to find the directory holding `.taskchain`.
pub fn find_repo_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir().map_err(ChainError::Io)?;
    loop {
        if dir.join(config::DIR_NAME).exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(ChainError::NotInitialized);
        }
    }
}

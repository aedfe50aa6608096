use std::path::Path;

use crate::error::Result;
use crate::model::NewTask;
use crate::output::{self, Format};
use crate::propagate::ConflictPolicy;
use crate::store::repo::Repo;

pub fn run(
    repo_root: &Path,
    title: String,
    description: String,
    depends_on: Vec<u64>,
    policy: Option<ConflictPolicy>,
    format: Format,
) -> Result<()> {
    let mut repo = Repo::open_locked(repo_root, policy)?;
    let task = repo.tasks.create(NewTask {
        title,
        description,
        dependencies: depends_on,
    })?;
    output::print_task(&task, format)
}

use std::path::Path;

use crate::error::Result;
use crate::model::{Status, Task};
use crate::output::{self, Format};
use crate::store::repo::Repo;

pub fn run(
    repo_root: &Path,
    status: Option<Status>,
    depends_on: Option<u64>,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(repo_root, None)?;

    let tasks: Vec<Task> = repo
        .tasks
        .tasks()
        .iter()
        .filter(|t| status.is_none_or(|s| t.status == s))
        .filter(|t| depends_on.is_none_or(|id| t.depends_on(id)))
        .cloned()
        .collect();

    output::print_tasks(&tasks, format)
}

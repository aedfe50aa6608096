use std::path::Path;

use crate::error::Result;
use crate::model::{EditTask, Status};
use crate::output::{self, Format};
use crate::propagate::ConflictPolicy;
use crate::store::repo::Repo;

#[allow(clippy::too_many_arguments)]
pub fn run(
    repo_root: &Path,
    id: u64,
    title: Option<String>,
    description: Option<String>,
    status: Option<Status>,
    depends_on: Option<Vec<u64>>,
    policy: Option<ConflictPolicy>,
    format: Format,
) -> Result<()> {
    let mut repo = Repo::open_locked(repo_root, policy)?;
    let report = repo.tasks.edit(
        id,
        EditTask {
            title,
            description,
            status,
            dependencies: depends_on,
        },
    )?;
    output::print_report(&report, format)
}

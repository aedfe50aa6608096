use std::path::Path;

use crate::error::Result;
use crate::model::Status;
use crate::output::{self, Format};
use crate::propagate::ConflictPolicy;
use crate::store::repo::Repo;

/// Set a task's status and write the propagated updates.
pub fn set(
    repo_root: &Path,
    id: u64,
    status: Status,
    policy: Option<ConflictPolicy>,
    format: Format,
) -> Result<()> {
    let mut repo = Repo::open_locked(repo_root, policy)?;
    let report = repo.tasks.set_status(id, status)?;
    output::print_report(&report, format)
}

/// Show what setting a task's status would change, without writing anything.
pub fn preview(
    repo_root: &Path,
    id: u64,
    status: Status,
    policy: Option<ConflictPolicy>,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(repo_root, policy)?;
    let changed = repo.tasks.get(id)?.with_status(status);
    let plan = repo.tasks.plan(changed);
    output::print_updates(&plan.updates, format)
}

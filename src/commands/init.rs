use std::path::Path;

use crate::error::Result;
use crate::store::repo::Repo;

pub fn run(repo_root: &Path) -> Result<()> {
    let root = Repo::init(repo_root)?;
    eprintln!("Initialized {} in {}", root.display(), repo_root.display());
    Ok(())
}

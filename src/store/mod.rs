pub mod db;
pub mod lock;
pub mod repo;
pub mod tasklist;

use crate::error::Result;
use crate::model::{NewTask, Status, StatusUpdate, Task};

/// Durable record storage for tasks and dependency edges.
pub trait Persistence {
    /// Every task with its dependency snapshots resolved.
    fn load_tasks(&self) -> Result<Vec<Task>>;

    fn load_task(&self, id: u64) -> Result<Task>;

    /// Insert a task and its dependency edges; all or nothing.
    fn insert_task(&self, draft: &NewTask, status: Status) -> Result<Task>;

    /// Write `changed` (row and dependency edges) and upsert `updates` as a
    /// single unit. Nothing is written if any part fails.
    fn apply_change(&self, changed: &Task, updates: &[StatusUpdate]) -> Result<()>;
}

impl<P: Persistence + ?Sized> Persistence for &P {
    fn load_tasks(&self) -> Result<Vec<Task>> {
        (**self).load_tasks()
    }

    fn load_task(&self, id: u64) -> Result<Task> {
        (**self).load_task(id)
    }

    fn insert_task(&self, draft: &NewTask, status: Status) -> Result<Task> {
        (**self).insert_task(draft, status)
    }

    fn apply_change(&self, changed: &Task, updates: &[StatusUpdate]) -> Result<()> {
        (**self).apply_change(changed, updates)
    }
}

//! In-memory task list backed by a [`Persistence`] implementation.
//!
//! A status change goes through two steps. [`TaskList::plan`] computes the
//! propagated updates against the cached snapshot and touches nothing.
//! [`TaskList::commit`] writes the changed task and the updates in a single
//! persistence call, and only on success merges them into the cache.
//!
//! Nothing serializes plans against each other. A plan remembers the cache
//! generation it was computed from; committing it after the cache moved on is
//! allowed and reported as stale, and the later commit's statuses are what end
//! up stored. Callers that need mutual exclusion take a
//! [`WriteLock`](crate::store::lock::WriteLock) around the whole sequence.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::{ChainError, Result};
use crate::model::{Dependency, EditTask, NewTask, Status, StatusUpdate, Task};
use crate::graph::TaskGraph;
use crate::propagate::{Propagator, settle_status};
use crate::store::Persistence;

/// Updates computed for one change, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub changed: Task,
    pub updates: Vec<StatusUpdate>,
    generation: u64,
}

impl Plan {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub changed: Task,
    pub updates: Vec<StatusUpdate>,
    /// The cache changed between planning and committing.
    pub stale: bool,
}

pub struct TaskList<P> {
    persistence: P,
    propagator: Propagator,
    tasks: Vec<Task>,
    generation: u64,
    fetched: bool,
}

impl<P: Persistence> TaskList<P> {
    pub fn new(persistence: P, propagator: Propagator) -> Self {
        Self {
            persistence,
            propagator,
            tasks: Vec::new(),
            generation: 0,
            fetched: false,
        }
    }

    /// Replace the cache with everything persistence currently holds.
    pub fn fetch(&mut self) -> Result<()> {
        self.tasks = self.persistence.load_tasks()?;
        self.fetched = true;
        self.generation += 1;
        debug!(tasks = self.tasks.len(), "fetched task list");
        Ok(())
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn get(&self, id: u64) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or(ChainError::TaskNotFound(id))
    }

    pub fn plan(&self, changed: Task) -> Plan {
        let updates = self
            .propagator
            .ancestor_updates(&self.tasks, &changed, &mut HashSet::new());
        Plan {
            changed,
            updates,
            generation: self.generation,
        }
    }

    /// Persist a plan, then merge it into the cache.
    ///
    /// On error the cache is left exactly as it was.
    pub fn commit(&mut self, plan: Plan) -> Result<CommitReport> {
        let stale = plan.generation != self.generation;
        if stale {
            warn!(
                task = plan.changed.id,
                planned_at = plan.generation,
                current = self.generation,
                "committing plan computed from an older snapshot"
            );
        }

        self.persistence.apply_change(&plan.changed, &plan.updates)?;
        self.merge(&plan.changed, &plan.updates);

        info!(
            task = plan.changed.id,
            status = %plan.changed.status,
            updates = plan.updates.len(),
            stale,
            "committed status change"
        );
        Ok(CommitReport {
            changed: plan.changed,
            updates: plan.updates,
            stale,
        })
    }

    pub fn update(&mut self, changed: Task) -> Result<CommitReport> {
        let plan = self.plan(changed);
        self.commit(plan)
    }

    /// Request a new status for `id`. The stored status follows the same
    /// dependency rule as [`TaskList::edit`].
    pub fn set_status(&mut self, id: u64, status: Status) -> Result<CommitReport> {
        let mut changed = self.get(id)?.with_status(status);
        changed.status = self.admissible_status(&changed);
        if changed.status != status {
            debug!(
                task = id,
                requested = %status,
                stored = %changed.status,
                "status adjusted to dependencies"
            );
        }
        self.update(changed)
    }

    /// Create a task. It starts `blocked` when any dependency is not done,
    /// otherwise `todo`.
    pub fn create(&mut self, mut draft: NewTask) -> Result<Task> {
        draft.normalize();
        require_text("title", &draft.title)?;
        require_text("description", &draft.description)?;
        let dependencies = self.snapshots(&draft.dependencies)?;

        let status = if dependencies.iter().all(|dep| dep.status == Status::Done) {
            Status::Todo
        } else {
            Status::Blocked
        };

        let task = self.persistence.insert_task(&draft, status)?;
        self.tasks.push(task.clone());
        self.generation += 1;
        info!(task = task.id, status = %task.status, "created task");
        Ok(task)
    }

    /// Apply field edits to a task and propagate the resulting status.
    ///
    /// The status is settled against the new dependency list. Dependencies
    /// that would close a cycle are rejected.
    pub fn edit(&mut self, id: u64, edit: EditTask) -> Result<CommitReport> {
        let mut task = self.get(id)?.clone();

        if let Some(title) = edit.title {
            require_text("title", &title)?;
            task.title = title.trim().to_string();
        }
        if let Some(description) = edit.description {
            require_text("description", &description)?;
            task.description = description.trim().to_string();
        }
        if let Some(mut ids) = edit.dependencies {
            ids.sort_unstable();
            ids.dedup();
            if ids.contains(&id) {
                return Err(ChainError::SelfDependency(id));
            }
            task.dependencies = self.snapshots(&ids)?;
            let graph = TaskGraph::new(&self.tasks);
            if ids.iter().any(|&dep| graph.reaches(dep, id)) {
                return Err(ChainError::CycleDetected(id));
            }
        }
        if let Some(status) = edit.status {
            task.status = status;
        }

        task.status = self.admissible_status(&task);
        self.update(task)
    }

    /// `blocked` while any dependency is not done; a task whose dependencies
    /// are all done cannot stay `blocked` and drops to `todo`.
    fn admissible_status(&self, task: &Task) -> Status {
        let blocked =
            settle_status(&self.tasks, &task.with_status(Status::Todo)) == Status::Blocked;
        match (blocked, task.status) {
            (true, _) => Status::Blocked,
            (false, Status::Blocked) => Status::Todo,
            (false, status) => status,
        }
    }

    fn snapshots(&self, ids: &[u64]) -> Result<Vec<Dependency>> {
        ids.iter()
            .map(|&dep| {
                self.get(dep)
                    .map(Task::snapshot)
                    .map_err(|_| ChainError::UnknownDependency(dep))
            })
            .collect()
    }

    /// Replace the changed task, then overwrite only the status of each
    /// updated task. Embedded dependency copies are refreshed to match.
    fn merge(&mut self, changed: &Task, updates: &[StatusUpdate]) {
        match self.tasks.iter_mut().find(|task| task.id == changed.id) {
            Some(slot) => *slot = changed.clone(),
            None => self.tasks.push(changed.clone()),
        }

        let mut statuses: HashMap<u64, Status> =
            updates.iter().map(|u| (u.id, u.status)).collect();
        for task in &mut self.tasks {
            if let Some(&status) = statuses.get(&task.id) {
                task.status = status;
            }
        }
        statuses.insert(changed.id, changed.status);

        for task in &mut self.tasks {
            for dep in &mut task.dependencies {
                if dep.id == changed.id {
                    dep.title.clone_from(&changed.title);
                    dep.description.clone_from(&changed.description);
                }
                if let Some(&status) = statuses.get(&dep.id) {
                    dep.status = status;
                }
            }
        }
        self.generation += 1;
    }
}

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChainError::EmptyField(field));
    }
    Ok(())
}

//! Status propagation across the dependency graph.
//!
//! When one task's status changes, every task that depends on it (directly or
//! transitively) may need a new derived status. The walk below visits each id
//! at most once per call, so cycles terminate and diamonds do not re-expand
//! shared ancestors. It runs on an explicit stack rather than the call stack.
//!
//! Each branch sees the hypothetical statuses of the tasks on its own path
//! from the changed task, but not the statuses computed on sibling branches.
//! Ancestors reached by more than one path are reported once; which computed
//! status survives is decided by [`ConflictPolicy`].

use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::graph::TaskGraph;
use crate::model::{Status, StatusUpdate, Task};

/// How to settle an ancestor that received different statuses on different paths.
///
/// With the current derivation rule both policies produce the same updates.
/// Only direct parents of the changed task can derive `todo`, and every later
/// derivation of the same id sees an open dependency on its path and yields
/// `blocked`, so "last computed" already is "blocked wins". The setting is kept
/// so a change to the derivation rule does not silently change the outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The status computed last in traversal order is kept.
    #[default]
    LastComputed,
    /// `blocked` is kept if any path computed it.
    BlockedWins,
}

impl ConflictPolicy {
    fn settle(self, earlier: Status, later: Status) -> Status {
        match self {
            Self::LastComputed => later,
            Self::BlockedWins if earlier == Status::Blocked => Status::Blocked,
            Self::BlockedWins => later,
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastComputed => write!(f, "last_computed"),
            Self::BlockedWins => write!(f, "blocked_wins"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Propagator {
    policy: ConflictPolicy,
}

impl Propagator {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    /// Compute the status updates for every ancestor of `changed`.
    ///
    /// `visited` holds ids already expanded; pass an empty set for a fresh
    /// call. `changed` itself never appears in the result.
    pub fn ancestor_updates(
        &self,
        tasks: &[Task],
        changed: &Task,
        visited: &mut HashSet<u64>,
    ) -> Vec<StatusUpdate> {
        let graph = TaskGraph::with_override(tasks, changed);
        let computed = walk(&graph, changed.id, visited);
        let merged = merge(computed, changed.id, self.policy);
        debug!(
            task = changed.id,
            status = %changed.status,
            policy = %self.policy,
            updates = merged.len(),
            "propagated status change"
        );
        merged
    }
}

/// Ancestor updates with the default [`ConflictPolicy`].
pub fn compute_ancestor_updates(
    tasks: &[Task],
    changed: &Task,
    visited: &mut HashSet<u64>,
) -> Vec<StatusUpdate> {
    Propagator::default().ancestor_updates(tasks, changed, visited)
}

/// Status `task` should have given the current statuses of its dependencies
/// in `tasks`. Returns `task.status` unchanged when nothing blocks it.
pub fn settle_status(tasks: &[Task], task: &Task) -> Status {
    let graph = TaskGraph::with_override(tasks, task);
    match graph.derived_status(task.id, &[]) {
        Status::Blocked => Status::Blocked,
        _ => task.status,
    }
}

struct Frame {
    parents: Vec<StatusUpdate>,
    next: usize,
    /// Overlay length to restore once this frame is finished.
    mark: usize,
}

/// Expand `id` if it has not been visited: derive the status of each direct
/// parent under `overlay`, record it, and return the frame to descend into.
fn expand(
    graph: &TaskGraph,
    id: u64,
    overlay: &[(u64, Status)],
    visited: &mut HashSet<u64>,
    computed: &mut Vec<StatusUpdate>,
) -> Option<Vec<StatusUpdate>> {
    if !visited.insert(id) {
        trace!(task = id, "already visited");
        return None;
    }
    let parents: Vec<StatusUpdate> = graph
        .parents_of(id)
        .iter()
        .map(|&parent| StatusUpdate {
            id: parent,
            status: graph.derived_status(parent, overlay),
        })
        .collect();
    if parents.is_empty() {
        return None;
    }
    trace!(task = id, parents = parents.len(), "expanded");
    computed.extend_from_slice(&parents);
    Some(parents)
}

/// Every update in the order the recursive definition would produce them:
/// all direct parents of a task first, then each parent's own ancestors.
fn walk(graph: &TaskGraph, root: u64, visited: &mut HashSet<u64>) -> Vec<StatusUpdate> {
    let mut computed = Vec::new();
    let mut overlay: Vec<(u64, Status)> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    if let Some(parents) = expand(graph, root, &overlay, visited, &mut computed) {
        stack.push(Frame {
            parents,
            next: 0,
            mark: 0,
        });
    }

    while let Some(frame) = stack.last_mut() {
        let Some(&parent) = frame.parents.get(frame.next) else {
            let mark = frame.mark;
            stack.pop();
            overlay.truncate(mark);
            continue;
        };
        frame.next += 1;

        let mark = overlay.len();
        overlay.push((parent.id, parent.status));
        match expand(graph, parent.id, &overlay, visited, &mut computed) {
            Some(parents) => stack.push(Frame {
                parents,
                next: 0,
                mark,
            }),
            None => overlay.truncate(mark),
        }
    }

    computed
}

/// Deduplicate by id, keeping each id at its first position.
fn merge(computed: Vec<StatusUpdate>, root: u64, policy: ConflictPolicy) -> Vec<StatusUpdate> {
    let mut positions: HashMap<u64, usize> = HashMap::new();
    let mut merged: Vec<StatusUpdate> = Vec::new();
    for update in computed {
        if update.id == root {
            continue;
        }
        match positions.get(&update.id) {
            Some(&pos) => {
                let slot = &mut merged[pos];
                slot.status = policy.settle(slot.status, update.status);
            }
            None => {
                positions.insert(update.id, merged.len());
                merged.push(update);
            }
        }
    }
    merged
}

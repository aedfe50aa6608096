//! Id-keyed view of a task list.
//!
//! Tasks carry denormalized copies of their dependencies. The graph keeps only
//! the dependency ids (plus the embedded status as a fallback for ids missing
//! from the list) and always resolves the current status by id lookup.

use std::collections::{HashMap, HashSet};

use crate::model::{Status, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRef {
    pub id: u64,
    /// Status recorded in the embedded copy, used only when `id` is unknown.
    pub fallback: Status,
}

#[derive(Debug, Clone)]
struct Node {
    status: Status,
    dependencies: Vec<DependencyRef>,
}

/// Status overrides stacked on top of the graph, newest last.
pub type Overlay = [(u64, Status)];

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    order: Vec<u64>,
    nodes: HashMap<u64, Node>,
    dependents: HashMap<u64, Vec<u64>>,
}

impl TaskGraph {
    pub fn new(tasks: &[Task]) -> Self {
        Self::build(tasks, None)
    }

    /// Build a working snapshot where `changed` replaces any task with the same
    /// id, or is appended when the list does not know it yet.
    pub fn with_override(tasks: &[Task], changed: &Task) -> Self {
        Self::build(tasks, Some(changed))
    }

    fn build(tasks: &[Task], changed: Option<&Task>) -> Self {
        let mut order = Vec::with_capacity(tasks.len() + 1);
        let mut nodes = HashMap::with_capacity(tasks.len() + 1);
        for task in tasks {
            let task = match changed {
                Some(changed) if changed.id == task.id => changed,
                _ => task,
            };
            if nodes.insert(task.id, node_of(task)).is_none() {
                order.push(task.id);
            }
        }
        if let Some(changed) = changed {
            if !nodes.contains_key(&changed.id) {
                nodes.insert(changed.id, node_of(changed));
                order.push(changed.id);
            }
        }
        let mut graph = Self {
            order,
            nodes,
            dependents: HashMap::new(),
        };
        graph.index_dependents();
        graph
    }

    fn index_dependents(&mut self) {
        for &id in &self.order {
            let node = &self.nodes[&id];
            for (pos, dep) in node.dependencies.iter().enumerate() {
                // a parent is listed once even if it names the same dependency twice
                if node.dependencies[..pos].iter().any(|d| d.id == dep.id) {
                    continue;
                }
                self.dependents.entry(dep.id).or_default().push(id);
            }
        }
    }

    pub fn status(&self, id: u64) -> Option<Status> {
        self.nodes.get(&id).map(|node| node.status)
    }

    /// Tasks whose dependency list names `id`, in task-list order.
    pub fn parents_of(&self, id: u64) -> &[u64] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependencies_of(&self, id: u64) -> &[DependencyRef] {
        self.nodes
            .get(&id)
            .map(|node| node.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Whether following dependency edges from `from` leads to `target`.
    pub fn reaches(&self, from: u64, target: u64) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.extend(self.dependencies_of(id).iter().map(|dep| dep.id));
        }
        false
    }

    /// Latest known status of a dependency: overlay first, then the graph,
    /// then the embedded copy.
    pub fn resolve(&self, dep: &DependencyRef, overlay: &Overlay) -> Status {
        overlay
            .iter()
            .rev()
            .find(|(id, _)| *id == dep.id)
            .map(|(_, status)| *status)
            .or_else(|| self.status(dep.id))
            .unwrap_or(dep.fallback)
    }

    /// `blocked` if any dependency of `id` is not done, otherwise `todo`.
    /// A task without dependencies is never blocked.
    pub fn derived_status(&self, id: u64, overlay: &Overlay) -> Status {
        let blocked = self
            .dependencies_of(id)
            .iter()
            .any(|dep| self.resolve(dep, overlay) != Status::Done);
        if blocked { Status::Blocked } else { Status::Todo }
    }
}

fn node_of(task: &Task) -> Node {
    Node {
        status: task.status,
        dependencies: task
            .dependencies
            .iter()
            .map(|dep| DependencyRef {
                id: dep.id,
                fallback: dep.status,
            })
            .collect(),
    }
}

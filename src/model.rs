use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    /// Human label used by the pretty printer.
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Blocked => "Blocked",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Denormalized copy of a depended-on task, as of the last fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Task {
    pub fn snapshot(&self) -> Dependency {
        Dependency {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
        }
    }

    pub fn depends_on(&self, id: u64) -> bool {
        self.dependencies.iter().any(|dep| dep.id == id)
    }

    pub fn dependency_ids(&self) -> Vec<u64> {
        self.dependencies.iter().map(|dep| dep.id).collect()
    }

    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// A derived status change produced by propagation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: u64,
    pub status: Status,
}

/// Input for task creation; dependencies are referenced by id only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub dependencies: Vec<u64>,
}

impl NewTask {
    /// Trim text fields, then deduplicate and sort dependency ids for deterministic storage.
    pub fn normalize(&mut self) {
        let title = self.title.trim();
        if title.len() != self.title.len() {
            self.title = title.to_string();
        }
        let description = self.description.trim();
        if description.len() != self.description.len() {
            self.description = description.to_string();
        }
        self.dependencies.sort_unstable();
        self.dependencies.dedup();
    }
}

/// Field replacements for an existing task. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub dependencies: Option<Vec<u64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, status: Status, deps: Vec<Dependency>) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: String::new(),
            status,
            dependencies: deps,
        }
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, r#""in-progress""#);
        let parsed: Status = serde_json::from_str(r#""blocked""#).unwrap();
        assert_eq!(parsed, Status::Blocked);
    }

    #[test]
    fn status_parses_its_display_form() {
        for status in [Status::Todo, Status::InProgress, Status::Done, Status::Blocked] {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
        assert!("in_progress".parse::<Status>().is_err());
    }

    #[test]
    fn task_without_dependencies_field_deserializes() {
        let parsed: Task =
            serde_json::from_str(r#"{"id":1,"title":"A","description":"","status":"todo"}"#)
                .unwrap();
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn snapshot_drops_dependencies() {
        let a = task(1, Status::Done, vec![]);
        let b = task(2, Status::Todo, vec![a.snapshot()]);
        let snap = b.snapshot();
        assert_eq!(snap.id, 2);
        assert_eq!(snap.status, Status::Todo);
        assert!(b.depends_on(1));
        assert!(!b.depends_on(3));
    }

    #[test]
    fn normalize_trims_and_dedups() {
        let mut draft = NewTask {
            title: "  Write docs ".into(),
            description: "soon".into(),
            dependencies: vec![3, 1, 3, 2],
        };
        draft.normalize();
        assert_eq!(draft.title, "Write docs");
        assert_eq!(draft.dependencies, vec![1, 2, 3]);
    }
}

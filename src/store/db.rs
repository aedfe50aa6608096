use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::debug;

use crate::error::{ChainError, Result};
use crate::model::{Dependency, NewTask, Status, StatusUpdate, Task};
use crate::store::Persistence;

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// SQLite-backed task records: a `tasks` table plus a `dependencies`
/// edge table of (`task_id`, `dependency_id`) pairs.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'todo',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS dependencies (
                task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                dependency_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                PRIMARY KEY (task_id, dependency_id)
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_dependencies_dependency ON dependencies(dependency_id);",
        )?;
        Ok(())
    }

    fn dependency_snapshots(&self, task_id: Option<u64>) -> Result<HashMap<u64, Vec<Dependency>>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.task_id, t.id, t.title, t.description, t.status
             FROM dependencies d
             JOIN tasks t ON t.id = d.dependency_id
             WHERE ?1 IS NULL OR d.task_id = ?1
             ORDER BY d.task_id, d.rowid",
        )?;
        let rows = stmt.query_map(params![task_id], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                Dependency {
                    id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    status: row.get(4)?,
                },
            ))
        })?;

        let mut by_task: HashMap<u64, Vec<Dependency>> = HashMap::new();
        for row in rows {
            let (owner, dep) = row?;
            by_task.entry(owner).or_default().push(dep);
        }
        Ok(by_task)
    }
}

fn task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        dependencies: Vec::new(),
    })
}

fn require_task(tx: &Transaction<'_>, id: u64) -> Result<bool> {
    let found = tx
        .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn replace_edges(tx: &Transaction<'_>, task_id: u64, dependencies: &[u64]) -> Result<()> {
    tx.execute(
        "DELETE FROM dependencies WHERE task_id = ?1",
        params![task_id],
    )?;
    for &dep in dependencies {
        if dep == task_id {
            return Err(ChainError::SelfDependency(task_id));
        }
        if !require_task(tx, dep)? {
            return Err(ChainError::UnknownDependency(dep));
        }
        tx.execute(
            "INSERT OR IGNORE INTO dependencies (task_id, dependency_id) VALUES (?1, ?2)",
            params![task_id, dep],
        )?;
    }
    Ok(())
}

impl Persistence for SqliteStore {
    fn load_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description, status FROM tasks ORDER BY id")?;
        let mut tasks = stmt
            .query_map([], task_row)?
            .collect::<std::result::Result<Vec<Task>, _>>()?;

        let mut deps = self.dependency_snapshots(None)?;
        for task in &mut tasks {
            if let Some(list) = deps.remove(&task.id) {
                task.dependencies = list;
            }
        }
        Ok(tasks)
    }

    fn load_task(&self, id: u64) -> Result<Task> {
        let mut task = self
            .conn
            .query_row(
                "SELECT id, title, description, status FROM tasks WHERE id = ?1",
                params![id],
                task_row,
            )
            .optional()?
            .ok_or(ChainError::TaskNotFound(id))?;
        task.dependencies = self
            .dependency_snapshots(Some(id))?
            .remove(&id)
            .unwrap_or_default();
        Ok(task)
    }

    fn insert_task(&self, draft: &NewTask, status: Status) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO tasks (title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![draft.title, draft.description, status, now],
        )?;
        let id = u64::try_from(tx.last_insert_rowid()).map_err(|_| {
            ChainError::Db(rusqlite::Error::IntegralValueOutOfRange(
                0,
                tx.last_insert_rowid(),
            ))
        })?;
        // a failing edge drops the transaction, which also removes the task row
        replace_edges(&tx, id, &draft.dependencies)?;
        tx.commit()?;

        debug!(task = id, deps = draft.dependencies.len(), "inserted task");
        self.load_task(id)
    }

    fn apply_change(&self, changed: &Task, updates: &[StatusUpdate]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        let rows = tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3, updated_at = ?4
             WHERE id = ?5",
            params![changed.title, changed.description, changed.status, now, changed.id],
        )?;
        if rows == 0 {
            return Err(ChainError::TaskNotFound(changed.id));
        }
        replace_edges(&tx, changed.id, &changed.dependency_ids())?;

        for update in updates {
            tx.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![update.status, now, update.id],
            )?;
        }

        tx.commit()?;
        debug!(
            task = changed.id,
            updates = updates.len(),
            "persisted change"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(title: &str, deps: Vec<u64>) -> NewTask {
        NewTask {
            title: title.into(),
            description: format!("{title} description"),
            dependencies: deps,
        }
    }

    #[test]
    fn insert_assigns_sequential_ids_and_loads_snapshots() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store.insert_task(&draft("A", vec![]), Status::Done).unwrap();
        let b = store.insert_task(&draft("B", vec![a.id]), Status::Todo).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.dependencies.len(), 1);
        assert_eq!(b.dependencies[0].title, "A");
        assert_eq!(b.dependencies[0].status, Status::Done);
    }

    #[test]
    fn insert_with_unknown_dependency_leaves_no_row() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.insert_task(&draft("A", vec![99]), Status::Todo).unwrap_err();
        assert!(matches!(err, ChainError::UnknownDependency(99)));
        assert!(store.load_tasks().unwrap().is_empty());
    }

    #[test]
    fn dependency_order_follows_insertion() {
        let store = SqliteStore::open_memory().unwrap();
        store.insert_task(&draft("A", vec![]), Status::Done).unwrap();
        store.insert_task(&draft("B", vec![]), Status::Done).unwrap();
        let c = store.insert_task(&draft("C", vec![2, 1]), Status::Todo).unwrap();
        assert_eq!(c.dependency_ids(), vec![2, 1]);
    }

    #[test]
    fn apply_change_writes_task_and_updates_together() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store.insert_task(&draft("A", vec![]), Status::Done).unwrap();
        let b = store.insert_task(&draft("B", vec![a.id]), Status::Todo).unwrap();

        let changed = a.with_status(Status::InProgress);
        store
            .apply_change(&changed, &[StatusUpdate { id: b.id, status: Status::Blocked }])
            .unwrap();

        assert_eq!(store.load_task(a.id).unwrap().status, Status::InProgress);
        let b = store.load_task(b.id).unwrap();
        assert_eq!(b.status, Status::Blocked);
        assert_eq!(b.dependencies[0].status, Status::InProgress);
    }

    #[test]
    fn apply_change_rolls_back_on_bad_edge() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store.insert_task(&draft("A", vec![]), Status::Done).unwrap();
        let b = store.insert_task(&draft("B", vec![a.id]), Status::Todo).unwrap();

        let mut changed = a.with_status(Status::Todo);
        changed.dependencies.push(Dependency {
            id: 77,
            title: "ghost".into(),
            description: String::new(),
            status: Status::Done,
        });
        let err = store
            .apply_change(&changed, &[StatusUpdate { id: b.id, status: Status::Blocked }])
            .unwrap_err();

        assert!(matches!(err, ChainError::UnknownDependency(77)));
        assert_eq!(store.load_task(a.id).unwrap().status, Status::Done);
        assert_eq!(store.load_task(b.id).unwrap().status, Status::Todo);
    }

    #[test]
    fn apply_change_rejects_self_dependency() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store.insert_task(&draft("A", vec![]), Status::Todo).unwrap();
        let mut changed = a.clone();
        changed.dependencies.push(a.snapshot());
        let err = store.apply_change(&changed, &[]).unwrap_err();
        assert!(matches!(err, ChainError::SelfDependency(1)));
    }

    #[test]
    fn missing_task_is_reported() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.load_task(5).unwrap_err();
        assert!(matches!(err, ChainError::TaskNotFound(5)));
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_task(&draft("A", vec![]), Status::Todo).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let tasks = store.load_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "A");
    }
}

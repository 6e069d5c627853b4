//! Database layer for Hearth using Turso.
//!
//! Architecture:
//!   - Database file: .hearth/hearth.db
//!   - WAL mode: Write-Ahead Logging for concurrent reads during writes
//!   - Schema: tasks, categories, catalog, shopping_items tables
//!   - Tasks are paginated by (position DESC, id ASC); the cursor is the
//!     (position, id) key of the first task of the next page

use chrono::{DateTime, Utc};
use hearth_core::{NewTask, Task, TaskCursor, TaskId, TaskPage, TaskPatch, INCREMENT};
use std::path::Path;
use tracing::debug;
use turso::{params, Builder, Connection};

/// Database connection wrapper for Turso
pub struct Database {
    pub(crate) conn: Connection,
    path: String,
}

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("turso error: {0}")]
    Turso(#[from] turso::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("core error: {0}")]
    Core(#[from] hearth_core::Error),

    #[error("{0}")]
    Other(String),
}

impl DbError {
    pub(crate) fn task_not_found(id: &TaskId) -> Self {
        DbError::NotFound {
            entity: "task",
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

const TASK_COLUMNS: &str =
    "id, title, description, completed, author_id, type, position, created_at, updated_at";

impl Database {
    /// Open creates a new database connection at the specified path using Turso.
    ///
    /// The parent directory is created when missing. Call [`init_schema`](Self::init_schema)
    /// before first use.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        // PRAGMA statements may return rows, so they go through query()
        let _ = conn.query("PRAGMA journal_mode=WAL", params![]).await?;
        let _ = conn.query("PRAGMA busy_timeout=5000", params![]).await?;

        Ok(Database {
            conn,
            path: path_str,
        })
    }

    /// Returns the database file path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// InitSchema creates all tables and indexes. Idempotent.
    pub async fn init_schema(&self) -> Result<()> {
        let statements = vec![
            r#"CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                author_id TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'task',
                position REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS catalog (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                location TEXT,
                weight INTEGER NOT NULL DEFAULT 1,
                price REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS shopping_items (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 1,
                category_id INTEGER NOT NULL,
                checked INTEGER NOT NULL DEFAULT 0,
                price REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_tasks_position ON tasks(position DESC, id)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_author ON tasks(author_id)",
            "CREATE INDEX IF NOT EXISTS idx_catalog_name ON catalog(name)",
            "CREATE INDEX IF NOT EXISTS idx_catalog_weight ON catalog(weight)",
        ];

        for stmt in statements {
            self.conn.execute(stmt, params![]).await?;
        }

        Ok(())
    }

    /// CreateTask inserts a task above every existing one (max position + 1024).
    pub async fn create_task(&self, author_id: &str, new_task: &NewTask) -> Result<Task> {
        new_task.validate()?;

        let position = self.max_position().await?.unwrap_or(0.0) + INCREMENT;
        let now = Utc::now();
        let task = Task {
            id: TaskId::generate(),
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            completed: false,
            author_id: author_id.to_string(),
            task_type: new_task.task_type,
            position,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO tasks (id, title, description, completed, author_id, type, position, created_at, updated_at)
                 VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?)",
                params![
                    task.id.to_string(),
                    task.title.clone(),
                    task.description.clone(),
                    task.author_id.clone(),
                    task.task_type.to_string(),
                    task.position,
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                ],
            )
            .await?;

        debug!("created task {} at position {}", task.id, task.position);
        Ok(task)
    }

    /// Highest position in use, or None on an empty table.
    pub async fn max_position(&self) -> Result<Option<f64>> {
        let mut rows = self
            .conn
            .query("SELECT MAX(position) FROM tasks", params![])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get::<Option<f64>>(0)?)
        } else {
            Ok(None)
        }
    }

    /// GetTask retrieves a single task by ID.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        let query = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
        let mut rows = self.conn.query(&query, params![id.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            parse_task_row(&row)
        } else {
            Err(DbError::task_not_found(id))
        }
    }

    /// GetInfiniteTasks returns one page of tasks ordered by position descending.
    ///
    /// `cursor` is the `next_cursor` of the previous page. It carries the sort
    /// key itself, so the page resolves even when the task it was taken from
    /// has since been deleted or moved.
    pub async fn get_infinite_tasks(
        &self,
        limit: usize,
        cursor: Option<&TaskCursor>,
    ) -> Result<TaskPage> {
        let limit = limit.max(1);
        let fetch = (limit + 1) as i64;

        let mut rows = match cursor {
            None => {
                let query = format!(
                    "SELECT {} FROM tasks ORDER BY position DESC, id ASC LIMIT ?",
                    TASK_COLUMNS
                );
                self.conn.query(&query, params![fetch]).await?
            }
            Some(cursor) => {
                let query = format!(
                    "SELECT {} FROM tasks
                     WHERE position < ? OR (position = ? AND id >= ?)
                     ORDER BY position DESC, id ASC
                     LIMIT ?",
                    TASK_COLUMNS
                );
                self.conn
                    .query(
                        &query,
                        params![cursor.position, cursor.position, cursor.id.to_string(), fetch],
                    )
                    .await?
            }
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(parse_task_row(&row)?);
        }

        let next_cursor = if items.len() > limit {
            items.pop().map(|task| TaskCursor::at(&task))
        } else {
            None
        };

        Ok(TaskPage { items, next_cursor })
    }

    /// UpdateTask merges a patch into the stored task and returns the result.
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        patch.validate()?;

        let mut task = self.get_task(id).await?;
        if !task.apply(patch) {
            return Ok(task);
        }
        task.updated_at = Utc::now();

        self.conn
            .execute(
                "UPDATE tasks SET title = ?, description = ?, completed = ?, position = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    task.title.clone(),
                    task.description.clone(),
                    task.completed as i64,
                    task.position,
                    task.updated_at.to_rfc3339(),
                    task.id.to_string(),
                ],
            )
            .await?;

        Ok(task)
    }

    pub async fn update_task_status(&self, id: &TaskId, completed: bool) -> Result<Task> {
        self.update_task(id, &TaskPatch::completed(completed)).await
    }

    pub async fn update_task_position(&self, id: &TaskId, position: f64) -> Result<Task> {
        self.update_task(id, &TaskPatch::position(position)).await
    }

    /// DeleteTask removes a task and returns the removed record.
    pub async fn delete_task(&self, id: &TaskId) -> Result<Task> {
        let task = self.get_task(id).await?;
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?", params![id.to_string()])
            .await?;
        Ok(task)
    }

    /// GetTaskCount returns the total number of tasks in the database.
    pub async fn get_task_count(&self) -> Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM tasks", params![])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            Ok(0)
        }
    }
}

pub(crate) fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Other(format!("failed to parse {}: {}", column, e)))
}

/// Helper function to parse a task row from query results
fn parse_task_row(row: &turso::Row) -> Result<Task> {
    let id: String = row.get(0)?;
    let completed: i64 = row.get(3)?;
    let task_type: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Task {
        id: TaskId::parse(&id)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: completed != 0,
        author_id: row.get(4)?,
        task_type: task_type.parse()?,
        position: row.get(6)?,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

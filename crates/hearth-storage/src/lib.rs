//! Hearth Storage - Database layer for the task board and shopping list
//!
//! This crate wraps a local Turso database (SQLite compatible) and exposes
//! the operations the HTTP API needs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │         hearth-server (axum routes)         │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │         Hearth Storage (this crate)         │
//! │  • Database struct                          │
//! │  • task CRUD + cursor pagination            │
//! │  • categories, catalog, shopping items      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │         Turso Database                      │
//! │  • .hearth/hearth.db (WAL mode)             │
//! │  • Tables: tasks, categories, catalog,      │
//! │            shopping_items                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use hearth_core::{NewTask, TaskType};
//! use hearth_storage::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(".hearth/hearth.db").await?;
//! db.init_schema().await?;
//!
//! let task = db
//!     .create_task(
//!         "alice",
//!         &NewTask {
//!             title: "Water the plants #home".to_string(),
//!             description: None,
//!             task_type: TaskType::Task,
//!         },
//!     )
//!     .await?;
//!
//! let page = db.get_infinite_tasks(8, None).await?;
//! assert_eq!(page.items[0].id, task.id);
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod shopping;

pub use db::{Database, DbError, Result};

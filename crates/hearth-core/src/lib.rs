//! # hearth-core
//!
//! Core types for the Hearth household task board and shopping list.
//!
//! This crate provides the fundamental data structures used by the storage
//! layer, the HTTP server and the client-side list state:
//!
//! - [`Task`] records ordered by a fractional [`position`](Task::position)
//! - the [position allocator](position) used by drag-reorder
//! - [hashtag](hashtag) matching for title filters
//! - typed [real-time events](event::RealtimeEvent)
//! - the shopping list model (categories, catalog entries, list items)
//! - repository configuration ([`HearthConfig`])

pub mod config;
pub mod error;
pub mod event;
pub mod hashtag;
pub mod position;
pub mod shopping;
pub mod task;

pub use config::{AuthConfig, HearthConfig, ListConfig, RealtimeConfig, ServerConfig};
pub use error::{Error, Result};
pub use event::{RealtimeEvent, ShoppingPayload, TaskPayload};
pub use position::{allocate, Neighbors, Slot, DEGENERATE_POSITION, INCREMENT};
pub use shopping::{CatalogEntry, Category, NewCatalogEntry, ShoppingItem};
pub use task::{NewTask, Task, TaskCursor, TaskId, TaskPage, TaskPatch, TaskType};

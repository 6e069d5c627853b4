//! # hearth-client
//!
//! Client-side state for the Hearth task board.
//!
//! Data flows one way through the crate:
//!
//! ```text
//! user gesture ──► DragController ──► position::allocate ──► LocalListState (optimistic)
//!                                                                   │
//!                        TaskRemote (persist, never rolled back) ◄──┘
//!
//! EventBridge ──► Reconciler ──► LocalListState ──► visible list
//! ```
//!
//! [`Reconciler`] merges paginated fetches, optimistic edits, real-time events
//! and filters into one visible list. It performs no I/O: every input returns
//! the [`FetchCommand`]s the caller should run. [`board::spawn_board`] wraps it
//! in a single-writer task that owns all list state and executes those
//! commands against a [`TaskRemote`].

pub mod board;
pub mod bridge;
pub mod drag;
pub mod error;
pub mod filter;
pub mod http;
pub mod reconcile;
pub mod remote;
pub mod shopping;
pub mod state;

pub use board::{spawn_board, BoardCommand, BoardHandle, BoardSnapshot};
pub use bridge::{BroadcastBridge, EventBridge, SseBridge, SseDecoder, SseFrame};
pub use drag::{DragController, DragLocation, DragPhase, DropOutcome, Reposition};
pub use error::{ClientError, Result};
pub use filter::{AuthorFilter, FilterSet, Session};
pub use http::HttpTaskRemote;
pub use reconcile::{DeletionState, FetchCommand, Pagination, Reconciler};
pub use remote::{MutationError, Notification, NotificationLevel, Notifier, TaskRemote, TracingNotifier};
pub use shopping::ShoppingListState;
pub use state::{LocalListState, RemoveOutcome};

//! # hearth-server
//!
//! HTTP API for the Hearth task board and shopping list.
//!
//! Every mutation is written to storage first and then published on the
//! household's realtime channel, which clients follow through
//! `GET /api/realtime/:channel` (server-sent events).

pub mod auth;
pub mod error;
pub mod hub;
pub mod routes;
pub mod server;

pub use auth::{Caller, ANONYMOUS, USER_HEADER};
pub use error::{ApiError, ApiResult};
pub use hub::RealtimeHub;
pub use server::{router, serve, AppState, SharedState};

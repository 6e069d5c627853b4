//! Seams to the outside world: the remote mutation client and user notifications.

use async_trait::async_trait;
use hearth_core::{NewTask, Task, TaskCursor, TaskId, TaskPage};
use thiserror::Error;
use tracing::{info, warn};

/// Failure of a remote call. The display text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),
}

/// Storage-side operations the client depends on.
///
/// Calls are never cancelled once issued. Implementations must be cheap to
/// share across spawned tasks.
#[async_trait]
pub trait TaskRemote: Send + Sync {
    async fn fetch_page(
        &self,
        limit: usize,
        cursor: Option<&TaskCursor>,
    ) -> Result<TaskPage, MutationError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, MutationError>;

    async fn update_task_status(&self, id: &TaskId, completed: bool)
        -> Result<Task, MutationError>;

    async fn update_task_position(&self, id: &TaskId, position: f64)
        -> Result<Task, MutationError>;

    async fn delete_task(&self, id: &TaskId) -> Result<Task, MutationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives user-facing notifications (toasts in a UI, log lines in a CLI).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!("{}", notification.message),
            NotificationLevel::Error => warn!("{}", notification.message),
        }
    }
}

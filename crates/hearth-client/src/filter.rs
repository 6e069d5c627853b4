//! Filter and session state containers.
//!
//! These replace ambient UI stores: each is a plain value owned by the
//! [`Reconciler`](crate::Reconciler) and changed only through its methods.

use hearth_core::{hashtag, Task, TaskType};
use serde::{Deserialize, Serialize};

/// Whose tasks are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorFilter {
    #[default]
    All,
    /// Only tasks authored by the signed-in user.
    Mine,
}

/// The signed-in user, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
}

impl Session {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// Active filters. All of them must accept a task for it to be visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub author: AuthorFilter,
    /// Normalized hashtag (no leading `#`).
    pub hashtag: Option<String>,
    pub task_type: Option<TaskType>,
}

impl FilterSet {
    /// Hashtag button behaviour: clicking the active tag clears the filter,
    /// clicking any other tag replaces it.
    pub fn toggle_hashtag(&mut self, button_text: &str) {
        let clicked = hashtag::normalize(button_text);
        let active = self.hashtag.as_deref().map(hashtag::normalize);

        if active.as_deref() == Some(clicked.as_str()) {
            self.hashtag = None;
        } else {
            self.hashtag = Some(clicked);
        }
    }

    pub fn accepts(&self, task: &Task, session: &Session) -> bool {
        if self.author == AuthorFilter::Mine
            && session.user_id.as_deref() != Some(task.author_id.as_str())
        {
            return false;
        }
        if let Some(tag) = &self.hashtag {
            if !hashtag::matches(&task.title, tag) {
                return false;
            }
        }
        if let Some(task_type) = self.task_type {
            if task.task_type != task_type {
                return false;
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.author != AuthorFilter::All || self.hashtag.is_some() || self.task_type.is_some()
    }
}

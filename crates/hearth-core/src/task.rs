//! Task records and the page shape used by paginated fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Maximum accepted length of a task identifier.
pub const MAX_TASK_ID_LEN: usize = 64;

/// Maximum accepted length of a task title.
pub const MAX_TITLE_LEN: usize = 500;

/// A validated task identifier.
///
/// Identifiers are opaque, but they travel through URLs and headers, so only
/// ASCII alphanumerics, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Parse and validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_TASK_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidTaskId(raw.to_string()))
        }
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// TaskType decides which view a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    #[default]
    Task,
    Note,
    Idea,
    /// Routed to the shopping list view instead of the task board.
    Shopping,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Task,
        TaskType::Note,
        TaskType::Idea,
        TaskType::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Task => "task",
            TaskType::Note => "note",
            TaskType::Idea => "idea",
            TaskType::Shopping => "shopping",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidTaskType(s.to_string()))
    }
}

/// Task represents one entry of the task board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Free text; may embed `#word` or `#word-suffix` hashtags.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub author_id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Sort key; lists are displayed by position descending.
    pub position: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Apply a partial update in place. Returns true when any field changed.
    pub fn apply(&mut self, patch: &TaskPatch) -> bool {
        let before = self.clone();
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        *self != before
    }
}

/// Input for creating a task. Position and timestamps are assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: TaskType,
}

impl NewTask {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }
}

/// Partial update of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn position(position: f64) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn content(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.position.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(position) = self.position {
            if !position.is_finite() {
                return Err(Error::Validation(format!(
                    "position must be a finite number (got {})",
                    position
                )));
            }
        }
        Ok(())
    }
}

/// One page of a paginated task fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub items: Vec<Task>,
    /// Sort key of the first task of the following page, if any.
    #[serde(default)]
    pub next_cursor: Option<TaskCursor>,
}

/// Keyset cursor: the `(position, id)` sort key a page starts at.
///
/// The key is self-contained, so the page still resolves after the task it
/// was taken from is deleted or moved. On the wire it is `"<position>:<id>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskCursor {
    pub position: f64,
    pub id: TaskId,
}

impl TaskCursor {
    /// Cursor starting at `task`.
    pub fn at(task: &Task) -> Self {
        Self {
            position: task.position,
            id: task.id.clone(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("invalid cursor {:?}", raw));
        let (position, id) = raw.split_once(':').ok_or_else(invalid)?;
        let position: f64 = position.parse().map_err(|_| invalid())?;
        if !position.is_finite() {
            return Err(invalid());
        }
        Ok(Self {
            position,
            id: TaskId::parse(id)?,
        })
    }
}

impl fmt::Display for TaskCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.id)
    }
}

impl TryFrom<String> for TaskCursor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TaskCursor> for String {
    fn from(cursor: TaskCursor) -> Self {
        cursor.to_string()
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title is required".to_string()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title must be {} characters or less (got {})",
            MAX_TITLE_LEN,
            title.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn task(id: &str, title: &str, position: f64) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::parse(id).unwrap(),
            title: title.to_string(),
            description: None,
            completed: false,
            author_id: "alice".to_string(),
            task_type: TaskType::Task,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_validation() {
        assert!(TaskId::parse("c5a1f0e2-17b4-4d3a-9a57-0a3f1c7e2b11").is_ok());
        assert!(TaskId::parse("task_1").is_ok());

        assert!(TaskId::parse("").is_err());
        assert!(TaskId::parse("has space").is_err());
        assert!(TaskId::parse("../etc").is_err());
        assert!(TaskId::parse(&"x".repeat(MAX_TASK_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_task_type_roundtrip_names() {
        for task_type in TaskType::ALL {
            assert_eq!(task_type.as_str().parse::<TaskType>().unwrap(), task_type);
        }
        assert!("groceries".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_task_wire_format() {
        let task = fixtures::task("t1", "Buy milk #grocery", 1024.0);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["authorId"], "alice");
        assert_eq!(json["type"], "task");
        assert_eq!(json["position"], 1024.0);
        assert!(json.get("description").is_none());

        let bad = serde_json::json!({
            "id": "not valid",
            "title": "x",
            "completed": false,
            "authorId": "a",
            "type": "task",
            "position": 1.0,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        assert!(serde_json::from_value::<Task>(bad).is_err());
    }

    #[test]
    fn test_apply_patch_reports_change() {
        let mut task = fixtures::task("t1", "Old", 10.0);

        assert!(task.apply(&TaskPatch::completed(true)));
        assert!(task.completed);
        assert!(!task.apply(&TaskPatch::completed(true)));

        assert!(task.apply(&TaskPatch::content("New", "Details")));
        assert_eq!(task.title, "New");
        assert_eq!(task.description.as_deref(), Some("Details"));
        assert_eq!(task.position, 10.0);
    }

    #[test]
    fn test_patch_validation() {
        assert!(TaskPatch::position(f64::NAN).validate().is_err());
        assert!(TaskPatch::position(12.5).validate().is_ok());
        assert!(TaskPatch::content("  ", "d").validate().is_err());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_new_task_validation() {
        let new_task = NewTask {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            description: None,
            task_type: TaskType::Note,
        };
        assert!(new_task.validate().is_err());
    }

    #[test]
    fn test_cursor_wire_format() {
        let cursor = TaskCursor::at(&fixtures::task("t-2", "x", -1014.5));
        assert_eq!(cursor.to_string(), "-1014.5:t-2");
        assert_eq!(TaskCursor::parse("-1014.5:t-2").unwrap(), cursor);

        let page = TaskPage {
            items: Vec::new(),
            next_cursor: Some(TaskCursor::at(&fixtures::task("t1", "x", 2048.0))),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["nextCursor"], "2048:t1");

        assert!(TaskCursor::parse("t1").is_err());
        assert!(TaskCursor::parse("NaN:t1").is_err());
        assert!(TaskCursor::parse("12:bad id").is_err());
    }
}

//! Typed real-time events pushed to every client subscribed to a channel.
//!
//! On the wire an event is a name plus a JSON payload. Names are only looked
//! at here, in [`RealtimeEvent::decode`] and [`RealtimeEvent::name`]; the
//! rest of the system matches on the enum.

use serde::{Deserialize, Serialize};

use crate::shopping::ShoppingItem;
use crate::task::Task;
use crate::Result;

/// Payload of every task event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub task: Task,
}

/// Payload of every shopping list event. `shopping_item` is null when the list is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingPayload {
    pub shopping_item: Option<ShoppingItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    TaskCreated(TaskPayload),
    TaskUpdated(TaskPayload),
    /// Update made through the external edit endpoint.
    ApiTaskUpdated(TaskPayload),
    TaskDeleted(TaskPayload),
    ApiTaskDeleted(TaskPayload),
    ShoppingItemAdded(ShoppingPayload),
    ShoppingItemChecked(ShoppingPayload),
    ShoppingItemDeleted(ShoppingPayload),
    ShoppingItemQuantityUpdated(ShoppingPayload),
    ShoppingItemsCleared(ShoppingPayload),
}

impl RealtimeEvent {
    pub fn task_created(task: Task) -> Self {
        Self::TaskCreated(TaskPayload { task })
    }

    pub fn task_updated(task: Task) -> Self {
        Self::TaskUpdated(TaskPayload { task })
    }

    pub fn api_task_updated(task: Task) -> Self {
        Self::ApiTaskUpdated(TaskPayload { task })
    }

    pub fn task_deleted(task: Task) -> Self {
        Self::TaskDeleted(TaskPayload { task })
    }

    pub fn api_task_deleted(task: Task) -> Self {
        Self::ApiTaskDeleted(TaskPayload { task })
    }

    pub fn shopping(kind: fn(ShoppingPayload) -> Self, item: Option<ShoppingItem>) -> Self {
        kind(ShoppingPayload {
            shopping_item: item,
        })
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskCreated(_) => "task-created",
            Self::TaskUpdated(_) => "task-updated",
            Self::ApiTaskUpdated(_) => "api-task-updated",
            Self::TaskDeleted(_) => "task-deleted",
            Self::ApiTaskDeleted(_) => "api-task-deleted",
            Self::ShoppingItemAdded(_) => "new-shopping-item",
            Self::ShoppingItemChecked(_) => "shopping-item-checked",
            Self::ShoppingItemDeleted(_) => "shopping-item-deleted",
            Self::ShoppingItemQuantityUpdated(_) => "shopping-item-quantityUpdate",
            Self::ShoppingItemsCleared(_) => "shopping-items-cleared",
        }
    }

    /// JSON payload of the event.
    pub fn encode_data(&self) -> Result<String> {
        let data = match self {
            Self::TaskCreated(p)
            | Self::TaskUpdated(p)
            | Self::ApiTaskUpdated(p)
            | Self::TaskDeleted(p)
            | Self::ApiTaskDeleted(p) => serde_json::to_string(p)?,
            Self::ShoppingItemAdded(p)
            | Self::ShoppingItemChecked(p)
            | Self::ShoppingItemDeleted(p)
            | Self::ShoppingItemQuantityUpdated(p)
            | Self::ShoppingItemsCleared(p) => serde_json::to_string(p)?,
        };
        Ok(data)
    }

    /// Decode a named event. Unknown names yield `Ok(None)`.
    pub fn decode(name: &str, data: &str) -> Result<Option<Self>> {
        let event = match name {
            "task-created" => Self::TaskCreated(serde_json::from_str(data)?),
            "task-updated" => Self::TaskUpdated(serde_json::from_str(data)?),
            "api-task-updated" => Self::ApiTaskUpdated(serde_json::from_str(data)?),
            "task-deleted" => Self::TaskDeleted(serde_json::from_str(data)?),
            "api-task-deleted" => Self::ApiTaskDeleted(serde_json::from_str(data)?),
            "new-shopping-item" => Self::ShoppingItemAdded(serde_json::from_str(data)?),
            "shopping-item-checked" => Self::ShoppingItemChecked(serde_json::from_str(data)?),
            "shopping-item-deleted" => Self::ShoppingItemDeleted(serde_json::from_str(data)?),
            "shopping-item-quantityUpdate" => {
                Self::ShoppingItemQuantityUpdated(serde_json::from_str(data)?)
            }
            "shopping-items-cleared" => Self::ShoppingItemsCleared(serde_json::from_str(data)?),
            other => {
                tracing::debug!("ignoring unknown realtime event {:?}", other);
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    /// The task carried by a task event.
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::TaskCreated(p)
            | Self::TaskUpdated(p)
            | Self::ApiTaskUpdated(p)
            | Self::TaskDeleted(p)
            | Self::ApiTaskDeleted(p) => Some(&p.task),
            _ => None,
        }
    }
}

/// Channel name for a household or user scope.
pub fn channel_name(scope: &str) -> String {
    if scope.starts_with("user-") {
        scope.to_string()
    } else {
        format!("user-{}", scope)
    }
}

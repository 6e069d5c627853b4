//! External edit endpoint for scripts and integrations.
//!
//! Responses are part of the public contract:
//!
//! | case | status | body |
//! |---|---|---|
//! | secret missing or wrong | 401 | `{"error":"Unauthorized"}` |
//! | id missing or malformed | 400 | `{"error":"Invalid id"}` |
//! | body not JSON or wrongly typed | 400 | `{"error":"..."}` |
//! | unknown task | 404 | `{"error":"..."}` |
//! | success | 200 | `"Task updated"` |
//! | anything else | 500 | `{"message":"Internal server error"}` |

use axum::{
    extract::{Path, State},
    Json,
};
use hearth_core::RealtimeEvent;
use tracing::info;

use super::{parse_task_id, JsonBody};
use super::tasks::ContentBody;
use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::server::SharedState;

/// POST|PUT /api/tasks/edit/:id
pub async fn edit(
    State(app): State<SharedState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentBody>,
) -> ApiResult<Json<&'static str>> {
    let id = parse_task_id(&id)?;
    let patch = body.into_patch();
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "title or description is required".to_string(),
        ));
    }

    let task = app.db.write().await.update_task(&id, &patch).await?;
    info!(task = %task.id, by = %caller.user, "Task edited through the API");

    app.publish(RealtimeEvent::api_task_updated(task)).await;
    Ok(Json("Task updated"))
}

/// DELETE /api/tasks/edit/:id
pub async fn delete(
    State(app): State<SharedState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<&'static str>> {
    let id = parse_task_id(&id)?;
    let task = app.db.write().await.delete_task(&id).await?;
    info!(task = %task.id, by = %caller.user, "Task deleted through the API");

    app.publish(RealtimeEvent::api_task_deleted(task)).await;
    Ok(Json("Task deleted"))
}

/// POST|PUT /api/tasks/edit without an id
pub async fn missing_id(_caller: Caller) -> ApiError {
    ApiError::invalid_id()
}

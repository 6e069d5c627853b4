//! Task routes used by the board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hearth_core::{NewTask, RealtimeEvent, Task, TaskCursor, TaskPage, TaskPatch};
use serde::Deserialize;
use tracing::info;

use super::{parse_task_id, JsonBody};
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::server::SharedState;

/// Upper bound on `limit` to keep a single page cheap.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct PositionBody {
    pub position: f64,
}

/// Title and description changes only.
#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ContentBody {
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            ..TaskPatch::default()
        }
    }
}

/// GET /api/tasks?limit&cursor
pub async fn list(
    State(app): State<SharedState>,
    _caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskPage>> {
    let limit = query.limit.unwrap_or(app.page_size).clamp(1, MAX_PAGE_SIZE);
    let cursor = query.cursor.as_deref().map(TaskCursor::parse).transpose()?;

    let db = app.db.read().await;
    let page = db.get_infinite_tasks(limit, cursor.as_ref()).await?;
    Ok(Json(page))
}

/// POST /api/tasks
pub async fn create(
    State(app): State<SharedState>,
    caller: Caller,
    JsonBody(body): JsonBody<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = app.db.write().await.create_task(&caller.user, &body).await?;
    info!(task = %task.id, author = %caller.user, "Task created");

    app.publish(RealtimeEvent::task_created(task.clone())).await;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PATCH /api/tasks/:id
pub async fn update(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentBody>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = app
        .db
        .write()
        .await
        .update_task(&id, &body.into_patch())
        .await?;

    app.publish(RealtimeEvent::task_updated(task.clone())).await;
    Ok(Json(task))
}

/// PATCH /api/tasks/:id/status
pub async fn update_status(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = app
        .db
        .write()
        .await
        .update_task_status(&id, body.completed)
        .await?;

    app.publish(RealtimeEvent::task_updated(task.clone())).await;
    Ok(Json(task))
}

/// PATCH /api/tasks/:id/position
pub async fn update_position(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<PositionBody>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = app
        .db
        .write()
        .await
        .update_task_position(&id, body.position)
        .await?;

    app.publish(RealtimeEvent::task_updated(task.clone())).await;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id
pub async fn delete(
    State(app): State<SharedState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = app.db.write().await.delete_task(&id).await?;
    info!(task = %task.id, by = %caller.user, "Task deleted");

    app.publish(RealtimeEvent::task_deleted(task.clone())).await;
    Ok(Json(task))
}

//! [`TaskRemote`] over the hearth HTTP API.

use async_trait::async_trait;
use hearth_core::{NewTask, Task, TaskCursor, TaskId, TaskPage};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::remote::{MutationError, TaskRemote};

/// Header naming the acting user.
pub const USER_HEADER: &str = "X-Hearth-User";

#[derive(Debug, Clone)]
pub struct HttpTaskRemote {
    client: Client,
    base_url: String,
    secret: String,
    user: String,
}

impl HttpTaskRemote {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            user: user.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// User name sent with every request.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Authorized GET request for `path`.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.secret)
            .header(USER_HEADER, &self.user)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, MutationError> {
        let response = self.authorize(request).send().await.map_err(transport)?;
        parse_response(response).await
    }
}

#[async_trait]
impl TaskRemote for HttpTaskRemote {
    async fn fetch_page(
        &self,
        limit: usize,
        cursor: Option<&TaskCursor>,
    ) -> Result<TaskPage, MutationError> {
        debug!(limit, cursor = ?cursor, "Fetching task page");
        let mut request = self
            .client
            .get(self.url("/api/tasks"))
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor.to_string())]);
        }
        self.send(request).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, MutationError> {
        self.send(self.client.post(self.url("/api/tasks")).json(task))
            .await
    }

    async fn update_task_status(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> Result<Task, MutationError> {
        let url = self.url(&format!("/api/tasks/{}/status", id));
        self.send(self.client.patch(url).json(&json!({ "completed": completed })))
            .await
    }

    async fn update_task_position(
        &self,
        id: &TaskId,
        position: f64,
    ) -> Result<Task, MutationError> {
        let url = self.url(&format!("/api/tasks/{}/position", id));
        self.send(self.client.patch(url).json(&json!({ "position": position })))
            .await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<Task, MutationError> {
        let url = self.url(&format!("/api/tasks/{}", id));
        self.send(self.client.delete(url)).await
    }
}

/// Error bodies carry either `error` or, for collapsed server failures, `message`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, MutationError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(transport);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .error
        .or(body.message)
        .unwrap_or_else(|| status.to_string());
    Err(classify(status, message))
}

fn classify(status: StatusCode, message: String) -> MutationError {
    match status {
        StatusCode::UNAUTHORIZED => MutationError::Unauthorized,
        StatusCode::NOT_FOUND => MutationError::NotFound(message),
        StatusCode::BAD_REQUEST => MutationError::Validation(message),
        _ => MutationError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport(err: reqwest::Error) -> MutationError {
    MutationError::Transport(err.to_string())
}

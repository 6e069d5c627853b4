//! Axum web server for the task board and shopping list

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use hearth_core::{HearthConfig, RealtimeEvent};
use hearth_storage::Database;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::hub::{self, RealtimeHub};
use crate::routes::{edit, shopping, tasks};

/// Shared application state
pub struct AppState {
    pub db: RwLock<Database>,
    pub hub: RealtimeHub,
    /// Shared secret every authenticated request must carry
    pub secret: String,
    /// Channel mutations are published on
    pub channel: String,
    /// Page size when a request gives no limit
    pub page_size: usize,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, secret: impl Into<String>, config: &HearthConfig) -> Self {
        Self {
            db: RwLock::new(db),
            hub: RealtimeHub::new(config.realtime.buffer),
            secret: secret.into(),
            channel: config.realtime.channel.clone(),
            page_size: config.list.page_size,
        }
    }

    /// Publish on the household channel.
    pub async fn publish(&self, event: RealtimeEvent) {
        self.hub.publish(&self.channel, event).await;
    }
}

/// Build the API router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/realtime/:channel", get(hub::sse_handler))
        // Tasks
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/:id", patch(tasks::update).delete(tasks::delete))
        .route("/api/tasks/:id/status", patch(tasks::update_status))
        .route("/api/tasks/:id/position", patch(tasks::update_position))
        // External edit endpoint
        .route(
            "/api/tasks/edit",
            post(edit::missing_id).put(edit::missing_id),
        )
        .route(
            "/api/tasks/edit/:id",
            post(edit::edit).put(edit::edit).delete(edit::delete),
        )
        // Shopping
        .route(
            "/api/categories",
            get(shopping::list_categories).post(shopping::create_category),
        )
        .route(
            "/api/catalog",
            get(shopping::list_catalog).post(shopping::create_catalog_entry),
        )
        .route("/api/catalog/suggestions", get(shopping::suggestions))
        .route("/api/catalog/by-name/:name", get(shopping::catalog_by_name))
        .route("/api/catalog/reset-weights", post(shopping::reset_weights))
        .route(
            "/api/catalog/:id",
            axum::routing::delete(shopping::delete_catalog_entry),
        )
        .route("/api/catalog/:id/weight", patch(shopping::set_weight))
        .route("/api/catalog/:id/price", patch(shopping::set_price))
        .route(
            "/api/shopping",
            get(shopping::list_items)
                .post(shopping::add_item)
                .delete(shopping::clear_items),
        )
        .route("/api/shopping/check-all", post(shopping::check_all))
        .route("/api/shopping/:id", axum::routing::delete(shopping::delete_item))
        .route("/api/shopping/:id/checked", patch(shopping::set_checked))
        .route("/api/shopping/:id/quantity", patch(shopping::update_quantity))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the database and serve the API until the process is stopped
pub async fn serve(config: &HearthConfig) -> anyhow::Result<()> {
    let secret = config.api_secret()?;

    if let Some(parent) = config.server.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let db = Database::open(&config.server.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.server.database_path.display()
            )
        })?;
    db.init_schema().await?;

    let state = Arc::new(AppState::new(db, secret, config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(
        "Serving hearth on http://{} (channel {})",
        config.server.bind, config.realtime.channel
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hearth"
    }))
}

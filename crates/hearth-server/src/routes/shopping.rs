//! Shopping list routes: categories, the catalog and list items.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hearth_core::{
    CatalogEntry, Category, NewCatalogEntry, RealtimeEvent, ShoppingItem, ShoppingPayload,
};
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::server::SharedState;

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogBody {
    #[serde(flatten)]
    pub entry: NewCatalogEntry,
    #[serde(default)]
    pub add_to_list: bool,
}

#[derive(Debug, Deserialize)]
pub struct WeightBody {
    pub weight: i64,
}

#[derive(Debug, Deserialize)]
pub struct PriceBody {
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    /// `weight` orders by catalog weight instead of creation time
    pub order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub catalog_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CheckedBody {
    pub checked: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub removed: u64,
}

// --- categories ---

/// GET /api/categories
pub async fn list_categories(
    State(app): State<SharedState>,
    _caller: Caller,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(app.db.read().await.list_categories().await?))
}

/// POST /api/categories
pub async fn create_category(
    State(app): State<SharedState>,
    _caller: Caller,
    JsonBody(body): JsonBody<CategoryBody>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = app.db.write().await.create_category(&body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// --- catalog ---

/// GET /api/catalog?search
pub async fn list_catalog(
    State(app): State<SharedState>,
    _caller: Caller,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let db = app.db.read().await;
    let entries = match query.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => db.search_catalog(term).await?,
        _ => db.list_catalog().await?,
    };
    Ok(Json(entries))
}

/// GET /api/catalog/suggestions - entries not on the list, most used first
pub async fn suggestions(
    State(app): State<SharedState>,
    _caller: Caller,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    Ok(Json(app.db.read().await.list_catalog_not_on_list().await?))
}

/// GET /api/catalog/by-name/:name
pub async fn catalog_by_name(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(name): Path<String>,
) -> ApiResult<Json<CatalogEntry>> {
    Ok(Json(app.db.read().await.get_catalog_entry_by_name(&name).await?))
}

/// POST /api/catalog
pub async fn create_catalog_entry(
    State(app): State<SharedState>,
    _caller: Caller,
    JsonBody(body): JsonBody<NewCatalogBody>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    let db = app.db.write().await;
    let entry = db.create_catalog_entry(&body.entry, body.add_to_list).await?;
    if body.add_to_list {
        let item = db.get_item(entry.id).await?;
        publish_item(&app, RealtimeEvent::ShoppingItemAdded, item).await;
    }
    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST /api/catalog/reset-weights
pub async fn reset_weights(
    State(app): State<SharedState>,
    _caller: Caller,
) -> ApiResult<StatusCode> {
    app.db.write().await.reset_catalog_weights().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/catalog/:id/weight
pub async fn set_weight(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<WeightBody>,
) -> ApiResult<Json<CatalogEntry>> {
    Ok(Json(
        app.db.write().await.set_catalog_weight(id, body.weight).await?,
    ))
}

/// PATCH /api/catalog/:id/price
pub async fn set_price(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<PriceBody>,
) -> ApiResult<Json<CatalogEntry>> {
    Ok(Json(
        app.db.write().await.set_catalog_price(id, body.price).await?,
    ))
}

/// DELETE /api/catalog/:id
pub async fn delete_catalog_entry(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<CatalogEntry>> {
    Ok(Json(app.db.write().await.delete_catalog_entry(id).await?))
}

// --- list items ---

/// GET /api/shopping?order=weight
pub async fn list_items(
    State(app): State<SharedState>,
    _caller: Caller,
    Query(query): Query<ItemsQuery>,
) -> ApiResult<Json<Vec<ShoppingItem>>> {
    let db = app.db.read().await;
    let items = match query.order.as_deref() {
        Some("weight") => db.list_items_by_weight().await?,
        _ => db.list_items().await?,
    };
    Ok(Json(items))
}

/// POST /api/shopping
pub async fn add_item(
    State(app): State<SharedState>,
    _caller: Caller,
    JsonBody(body): JsonBody<AddItemBody>,
) -> ApiResult<(StatusCode, Json<ShoppingItem>)> {
    let item = app
        .db
        .write()
        .await
        .add_item_to_list(body.catalog_id, body.quantity)
        .await?;
    publish_item(&app, RealtimeEvent::ShoppingItemAdded, item.clone()).await;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/shopping/:id/checked
pub async fn set_checked(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<CheckedBody>,
) -> ApiResult<Json<ShoppingItem>> {
    let item = app.db.write().await.set_item_checked(id, body.checked).await?;
    publish_item(&app, RealtimeEvent::ShoppingItemChecked, item.clone()).await;
    Ok(Json(item))
}

/// POST /api/shopping/check-all
pub async fn check_all(
    State(app): State<SharedState>,
    _caller: Caller,
) -> ApiResult<Json<Vec<ShoppingItem>>> {
    let db = app.db.write().await;
    db.check_all_items().await?;
    let items = db.list_items().await?;
    for item in &items {
        publish_item(&app, RealtimeEvent::ShoppingItemChecked, item.clone()).await;
    }
    Ok(Json(items))
}

/// PATCH /api/shopping/:id/quantity
pub async fn update_quantity(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<QuantityBody>,
) -> ApiResult<Json<ShoppingItem>> {
    let item = app
        .db
        .write()
        .await
        .update_item_quantity(id, body.quantity)
        .await?;
    publish_item(&app, RealtimeEvent::ShoppingItemQuantityUpdated, item.clone()).await;
    Ok(Json(item))
}

/// DELETE /api/shopping/:id
pub async fn delete_item(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<ShoppingItem>> {
    let item = app.db.write().await.delete_item(id).await?;
    publish_item(&app, RealtimeEvent::ShoppingItemDeleted, item.clone()).await;
    Ok(Json(item))
}

/// DELETE /api/shopping
pub async fn clear_items(
    State(app): State<SharedState>,
    _caller: Caller,
) -> ApiResult<Json<ClearedResponse>> {
    let removed = app.db.write().await.clear_items().await?;
    app.publish(RealtimeEvent::shopping(RealtimeEvent::ShoppingItemsCleared, None))
        .await;
    Ok(Json(ClearedResponse { removed }))
}

async fn publish_item(
    app: &SharedState,
    kind: fn(ShoppingPayload) -> RealtimeEvent,
    item: ShoppingItem,
) {
    app.publish(RealtimeEvent::shopping(kind, Some(item))).await;
}

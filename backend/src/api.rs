use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use storefront::model::{
    DailyRevenue, NewOrder, NewProduct, Order, OrderStats, OrderStatus, Product, ProductPatch,
};
use storefront::storage::{MediaStorage, OrderStorage, ProductQuery, ProductStorage};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStorage>,
    pub orders: Arc<dyn OrderStorage>,
    pub media: Arc<dyn MediaStorage>,
}

/// Error taxonomy of the HTTP layer: validation failures are rejected before
/// reaching storage, absent entities map to 404, and storage failures pass
/// through as opaque 500s.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(#[from] Box<dyn Error + Send + Sync>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/featured", get(featured_products))
        .route("/api/products/brands", get(list_brands))
        .route("/api/products/slug/{slug}", get(get_product_by_slug))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/recent", get(recent_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", patch(update_order_status))
        .route("/api/stats", get(order_stats))
        .route("/api/stats/daily-revenue", get(daily_revenue))
        .route("/api/media", post(upload_media).delete(delete_media))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    /// Comma-separated brand names.
    pub brands: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub limit: Option<i64>,
}

impl ListProductsParams {
    fn into_query(self) -> ProductQuery {
        let brands = self
            .brands
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|brand| !brand.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        ProductQuery {
            brands,
            price_min: self.price_min,
            price_max: self.price_max,
            limit: self.limit,
        }
    }
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.list(&params.into_query()).await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct FeaturedParams {
    limit: Option<i64>,
}

async fn featured_products(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.featured(params.limit.unwrap_or(8)).await?;
    Ok(Json(products))
}

async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.products.brands().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.get(&id).await?;
    product.map(Json).ok_or(ApiError::NotFound("product"))
}

async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.get_by_slug(&slug).await?;
    product.map(Json).ok_or(ApiError::NotFound("product"))
}

async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    product.validate().map_err(ApiError::Validation)?;
    let created = state.products.create(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    patch.validate().map_err(ApiError::Validation)?;
    let current = state
        .products
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    patch
        .validate_merged_prices(&current)
        .map_err(ApiError::Validation)?;
    let updated = state.products.update(&id, &patch).await?;
    updated.map(Json).ok_or(ApiError::NotFound("product"))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.products.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("product"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListOrdersParams {
    status: Option<String>,
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(raw.parse::<OrderStatus>().map_err(ApiError::Validation)?),
    };
    Ok(Json(state.orders.list(status).await?))
}

#[derive(Debug, Deserialize)]
struct RecentOrdersParams {
    limit: Option<i64>,
}

async fn recent_orders(
    State(state): State<AppState>,
    Query(params): Query<RecentOrdersParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.recent(params.limit.unwrap_or(5)).await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.get(&id).await?;
    order.map(Json).ok_or(ApiError::NotFound("order"))
}

async fn create_order(
    State(state): State<AppState>,
    Json(order): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    order.validate().map_err(ApiError::Validation)?;
    let created = state.orders.create(&order).await?;
    tracing::info!(order_id = %created.id, "Checkout completed");
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct StatusUpdateRequest {
    status: String,
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let status = request
        .status
        .parse::<OrderStatus>()
        .map_err(ApiError::Validation)?;
    let updated = state.orders.update_status(&id, status).await?;
    updated.map(Json).ok_or(ApiError::NotFound("order"))
}

async fn order_stats(State(state): State<AppState>) -> Result<Json<OrderStats>, ApiError> {
    Ok(Json(state.orders.stats().await?))
}

#[derive(Debug, Deserialize)]
struct DailyRevenueParams {
    days: Option<i64>,
}

async fn daily_revenue(
    State(state): State<AppState>,
    Query(params): Query<DailyRevenueParams>,
) -> Result<Json<Vec<DailyRevenue>>, ApiError> {
    let days = params.days.unwrap_or(7);
    if days < 1 {
        return Err(ApiError::Validation("days must be at least 1".to_string()));
    }
    Ok(Json(state.orders.daily_revenue(days).await?))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    urls: Vec<String>,
}

async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut urls = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let url = state.media.upload(&filename, &bytes).await?;
        urls.push(url);
    }
    if urls.is_empty() {
        return Err(ApiError::Validation("no file fields in upload".to_string()));
    }
    Ok(Json(UploadResponse { urls }))
}

#[derive(Debug, Deserialize)]
struct DeleteMediaRequest {
    url: String,
}

async fn delete_media(
    State(state): State<AppState>,
    Json(request): Json<DeleteMediaRequest>,
) -> Result<StatusCode, ApiError> {
    state.media.delete(&request.url).await?;
    Ok(StatusCode::NO_CONTENT)
}

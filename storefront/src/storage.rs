use crate::model::{
    DailyRevenue, NewOrder, NewProduct, Order, OrderStats, OrderStatus, Product, ProductPatch,
};
use async_trait::async_trait;
use std::error::Error;

/// Server-side filter pushdown for product listings. Price bounds apply to
/// the list price column; the client-side filter store refines on effective
/// price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub brands: Vec<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub limit: Option<i64>,
}

/// Product persistence seam. Implementations are opaque request/response
/// wrappers: errors pass through unchanged and absent entities are
/// `Ok(None)`, never errors.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ProductStorage: Send + Sync {
    /// In-stock products matching the query, newest first.
    async fn list(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>>;

    /// Every product including out-of-stock ones, newest first (back office).
    async fn list_all(&self) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>>;

    async fn get(&self, id: &str) -> Result<Option<Product>, Box<dyn Error + Send + Sync>>;

    async fn get_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Product>, Box<dyn Error + Send + Sync>>;

    /// Newest in-stock products for the home page.
    async fn featured(&self, limit: i64) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>>;

    /// Distinct brands with in-stock products, sorted.
    async fn brands(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;

    async fn create(
        &self,
        product: &NewProduct,
    ) -> Result<Product, Box<dyn Error + Send + Sync>>;

    async fn update(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, Box<dyn Error + Send + Sync>>;

    /// Returns false when no product with that id existed.
    async fn delete(&self, id: &str) -> Result<bool, Box<dyn Error + Send + Sync>>;
}

/// Order persistence seam.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Orders newest first, optionally restricted to one status.
    async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, Box<dyn Error + Send + Sync>>;

    /// Order with its line items.
    async fn get(&self, id: &str) -> Result<Option<Order>, Box<dyn Error + Send + Sync>>;

    async fn recent(&self, limit: i64) -> Result<Vec<Order>, Box<dyn Error + Send + Sync>>;

    /// Create the order and all of its line items atomically: on failure
    /// nothing is persisted, so a failed checkout leaves no partial order
    /// behind and the caller's cart state untouched.
    async fn create(&self, order: &NewOrder) -> Result<Order, Box<dyn Error + Send + Sync>>;

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, Box<dyn Error + Send + Sync>>;

    async fn stats(&self) -> Result<OrderStats, Box<dyn Error + Send + Sync>>;

    /// Revenue of delivered orders per calendar day over the last `days`
    /// days, zero-filled so every day is present.
    async fn daily_revenue(
        &self,
        days: i64,
    ) -> Result<Vec<DailyRevenue>, Box<dyn Error + Send + Sync>>;
}

/// Object storage for product images (admin only).
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store the bytes under a collision-free name and return the public URL.
    async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Delete by public URL. A URL outside this store's base is a no-op.
    async fn delete(&self, url: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

use crate::db_model::{OrderItemRow, OrderRow, ProductRow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use storefront::model::{
    DailyRevenue, NewOrder, NewProduct, Order, OrderItem, OrderStats, OrderStatus, Product,
    ProductPatch,
};
use storefront::storage::{OrderStorage, ProductQuery, ProductStorage};
use tracing::{debug, info};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, slug, brand, price, sale_price, description, \
     specs_json, image_url, images_json, stock_status, created_at, updated_at";

const ORDER_COLUMNS: &str =
    "id, customer_info_json, total_amount, status, payment_method, notes, created_at, updated_at";

/// SQLite-backed storage for products and orders.
pub struct SqliteStore {
    pub pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory store. The pool must never recycle its
    /// connection, or the database vanishes with it.
    pub async fn in_memory() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn initialize_schema(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let init_sql = include_str!("../resources/init.sql");
        sqlx::raw_sql(init_sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_order_items(
        &self,
        order_id: &str,
    ) -> Result<Vec<OrderItem>, Box<dyn Error + Send + Sync>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, quantity, price_at_purchase, created_at \
             FROM order_items WHERE order_id = ? ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }
}

#[async_trait]
impl ProductStorage for SqliteStore {
    async fn list(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM products WHERE stock_status = 1",
            PRODUCT_COLUMNS
        ));
        if !query.brands.is_empty() {
            builder.push(" AND brand IN (");
            {
                let mut separated = builder.separated(", ");
                for brand in &query.brands {
                    separated.push_bind(brand);
                }
            }
            builder.push(")");
        }
        if let Some(price_min) = query.price_min {
            builder.push(" AND price >= ");
            builder.push_bind(price_min);
        }
        if let Some(price_max) = query.price_max {
            builder.push(" AND price <= ");
            builder.push_bind(price_max);
        }
        builder.push(" ORDER BY created_at DESC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn list_all(&self) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, Box<dyn Error + Send + Sync>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Product::try_from).transpose()
    }

    async fn get_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Product>, Box<dyn Error + Send + Sync>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE slug = ?", PRODUCT_COLUMNS))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Product::try_from).transpose()
    }

    async fn featured(&self, limit: i64) -> Result<Vec<Product>, Box<dyn Error + Send + Sync>> {
        ProductStorage::list(
            self,
            &ProductQuery {
                limit: Some(limit),
                ..ProductQuery::default()
            },
        )
        .await
    }

    async fn brands(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let brands: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT brand FROM products WHERE stock_status = 1 ORDER BY brand",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    async fn create(
        &self,
        product: &NewProduct,
    ) -> Result<Product, Box<dyn Error + Send + Sync>> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let specs_json = product
            .specs
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let images_json = serde_json::to_string(&product.images)?;

        sqlx::query(
            "INSERT INTO products (id, name, slug, brand, price, sale_price, description, \
             specs_json, image_url, images_json, stock_status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.brand)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(&product.description)
        .bind(&specs_json)
        .bind(&product.image_url)
        .bind(&images_json)
        .bind(product.stock_status)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("Created product {} ({})", product.name, id);
        ProductStorage::get(self, &id)
            .await?
            .ok_or_else(|| Box::<dyn Error + Send + Sync>::from("product missing after insert"))
    }

    async fn update(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, Box<dyn Error + Send + Sync>> {
        let Some(existing) = ProductStorage::get(self, id).await? else {
            return Ok(None);
        };

        let name = patch.name.clone().unwrap_or(existing.name);
        let slug = patch.slug.clone().unwrap_or(existing.slug);
        let brand = patch.brand.clone().unwrap_or(existing.brand);
        let price = patch.price.unwrap_or(existing.price);
        let sale_price = patch.sale_price.unwrap_or(existing.sale_price);
        let description = patch
            .description
            .clone()
            .unwrap_or(existing.description);
        let specs = patch.specs.clone().unwrap_or(existing.specs);
        let image_url = patch.image_url.clone().unwrap_or(existing.image_url);
        let images = patch.images.clone().unwrap_or(existing.images);
        let stock_status = patch.stock_status.unwrap_or(existing.stock_status);

        // The merged values must keep the sale price under the list price
        // even when the patch carries only one of the two.
        if let Some(sale_price) = sale_price {
            if sale_price >= price {
                return Err("sale price must be lower than the list price".into());
            }
        }

        let specs_json = specs.as_ref().map(serde_json::to_string).transpose()?;
        let images_json = serde_json::to_string(&images)?;

        sqlx::query(
            "UPDATE products SET name = ?, slug = ?, brand = ?, price = ?, sale_price = ?, \
             description = ?, specs_json = ?, image_url = ?, images_json = ?, stock_status = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&slug)
        .bind(&brand)
        .bind(price)
        .bind(sale_price)
        .bind(&description)
        .bind(&specs_json)
        .bind(&image_url)
        .bind(&images_json)
        .bind(stock_status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        debug!("Updated product {}", id);
        ProductStorage::get(self, id).await
    }

    async fn delete(&self, id: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStorage for SqliteStore {
    async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, Box<dyn Error + Send + Sync>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        if let Some(status) = status {
            builder.push(" WHERE status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows: Vec<OrderRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|row| row.into_order(vec![])).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, Box<dyn Error + Send + Sync>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.fetch_order_items(id).await?;
        Ok(Some(row.into_order(items)?))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Order>, Box<dyn Error + Send + Sync>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC LIMIT ?",
            ORDER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|row| row.into_order(vec![])).collect()
    }

    async fn create(&self, order: &NewOrder) -> Result<Order, Box<dyn Error + Send + Sync>> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let customer_info_json = serde_json::to_string(&order.customer_info)?;
        let total_amount = order.total_amount();

        debug!("Creating order {} with {} items", id, order.items.len());

        // The order and all of its items land in one transaction. A failure
        // at any point persists nothing.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, customer_info_json, total_amount, status, payment_method, \
             notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&customer_info_json)
        .bind(total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, \
                 price_at_purchase, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_at_purchase)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Created order {} (total {})", id, total_amount);

        OrderStorage::get(self, &id)
            .await?
            .ok_or_else(|| Box::<dyn Error + Send + Sync>::from("order missing after insert"))
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, Box<dyn Error + Send + Sync>> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!("Order {} moved to status {}", id, status);
        OrderStorage::get(self, id).await
    }

    async fn stats(&self) -> Result<OrderStats, Box<dyn Error + Send + Sync>> {
        let rows: Vec<(f64, String)> = sqlx::query_as("SELECT total_amount, status FROM orders")
            .fetch_all(&self.pool)
            .await?;

        let total_revenue = rows
            .iter()
            .filter(|(_, status)| status == OrderStatus::Delivered.as_str())
            .map(|(amount, _)| amount)
            .sum();
        let pending_orders = rows
            .iter()
            .filter(|(_, status)| status == OrderStatus::Pending.as_str())
            .count() as i64;

        Ok(OrderStats {
            total_revenue,
            total_orders: rows.len() as i64,
            pending_orders,
        })
    }

    async fn daily_revenue(
        &self,
        days: i64,
    ) -> Result<Vec<DailyRevenue>, Box<dyn Error + Send + Sync>> {
        if days <= 0 {
            return Ok(vec![]);
        }
        let today = Utc::now().date_naive();
        let start_day = today - Duration::days(days - 1);
        let window_start = start_day
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc();

        let rows: Vec<(f64, chrono::DateTime<Utc>)> = sqlx::query_as(
            "SELECT total_amount, created_at FROM orders \
             WHERE status = 'delivered' AND created_at >= ?",
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        // Every day of the window is present, zero-filled.
        let mut revenue_by_date = BTreeMap::new();
        for offset in 0..days {
            let date = (start_day + Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string();
            revenue_by_date.insert(date, 0.0);
        }
        for (amount, created_at) in rows {
            let date = created_at.date_naive().format("%Y-%m-%d").to_string();
            if let Some(revenue) = revenue_by_date.get_mut(&date) {
                *revenue += amount;
            }
        }

        Ok(revenue_by_date
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect())
    }
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::error::Error;
use storefront::model::{Order, OrderItem, Product};

/// Raw products row. Specs and image lists live in JSON columns and are
/// decoded into the domain types on conversion.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub description: Option<String>,
    pub specs_json: Option<String>,
    pub image_url: Option<String>,
    pub images_json: String,
    pub stock_status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = Box<dyn Error + Send + Sync>;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let specs = row
            .specs_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let images = serde_json::from_str(&row.images_json)?;
        Ok(Product {
            id: row.id,
            name: row.name,
            slug: row.slug,
            brand: row.brand,
            price: row.price,
            sale_price: row.sale_price,
            description: row.description,
            specs,
            image_url: row.image_url,
            images,
            stock_status: row.stock_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: String,
    pub customer_info_json: String,
    pub total_amount: f64,
    pub status: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Convert to the domain order with the given line items attached.
    pub fn into_order(self, items: Vec<OrderItem>) -> Result<Order, Box<dyn Error + Send + Sync>> {
        let customer_info = serde_json::from_str(&self.customer_info_json)?;
        let status = self
            .status
            .parse()
            .map_err(Box::<dyn Error + Send + Sync>::from)?;
        let payment_method = self
            .payment_method
            .parse()
            .map_err(Box::<dyn Error + Send + Sync>::from)?;
        Ok(Order {
            id: self.id,
            customer_info,
            total_amount: self.total_amount,
            status,
            payment_method,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub product_id: Option<String>,
    pub quantity: i64,
    pub price_at_purchase: f64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price_at_purchase: row.price_at_purchase,
            created_at: row.created_at,
        }
    }
}

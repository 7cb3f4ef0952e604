use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ModelId = String;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10,11}$").unwrap());
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Technical attributes of a watch, shown on the product detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSpecs {
    pub case_material: Option<String>,
    pub case_diameter: Option<String>,
    pub movement: Option<String>,
    pub water_resistance: Option<String>,
    pub crystal: Option<String>,
    pub strap_material: Option<String>,
    pub warranty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ModelId,
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub description: Option<String>,
    pub specs: Option<ProductSpecs>,
    pub image_url: Option<String>,
    pub images: Vec<String>,
    pub stock_status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Sale price when set, otherwise list price.
    pub fn effective_price(&self) -> f64 {
        self.sale_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub ward: String,
    pub district: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ModelId,
    pub order_id: ModelId,
    /// None when the product was deleted after the order was placed.
    pub product_id: Option<ModelId>,
    pub quantity: i64,
    /// Captured at order time, immutable thereafter.
    pub price_at_purchase: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: ModelId,
    pub customer_info: CustomerInfo,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Back-office dashboard summary. Revenue counts delivered orders only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub pending_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    /// Calendar day, YYYY-MM-DD.
    pub date: String,
    pub revenue: f64,
}

fn default_stock_status() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specs: Option<ProductSpecs>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_stock_status")]
    pub stock_status: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), String> {
        validate_product_fields(
            &self.name,
            &self.slug,
            &self.brand,
            self.price,
            self.sale_price,
            self.description.as_deref(),
        )
    }
}

/// Partial product update. Absent fields keep the stored value; fields that
/// can be cleared (sale price, description, specs, image) distinguish
/// "absent" from "present and null".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    #[serde(deserialize_with = "double_option")]
    pub sale_price: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub specs: Option<Option<ProductSpecs>>,
    #[serde(deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub stock_status: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            let len = name.chars().count();
            if !(3..=255).contains(&len) {
                return Err("name must be between 3 and 255 characters".to_string());
            }
        }
        if let Some(slug) = &self.slug {
            if slug.trim().is_empty() {
                return Err("slug is required".to_string());
            }
        }
        if let Some(brand) = &self.brand {
            let len = brand.chars().count();
            if !(1..=100).contains(&len) {
                return Err("brand must be between 1 and 100 characters".to_string());
            }
        }
        if let Some(price) = self.price {
            if price <= 0.0 {
                return Err("price must be greater than 0".to_string());
            }
        }
        if let Some(Some(sale_price)) = self.sale_price {
            if sale_price <= 0.0 {
                return Err("sale price must be greater than 0".to_string());
            }
            if let Some(price) = self.price {
                if sale_price >= price {
                    return Err("sale price must be lower than the list price".to_string());
                }
            }
        }
        if let Some(Some(description)) = &self.description {
            if description.chars().count() > 5000 {
                return Err("description is too long".to_string());
            }
        }
        Ok(())
    }

    /// Check the price invariant against the values that would be stored
    /// after merging this patch over the current product. A patch carrying
    /// only one of the two prices can still break `sale_price < price`.
    pub fn validate_merged_prices(&self, current: &Product) -> Result<(), String> {
        let price = self.price.unwrap_or(current.price);
        let sale_price = self.sale_price.unwrap_or(current.sale_price);
        if let Some(sale_price) = sale_price {
            if sale_price >= price {
                return Err("sale price must be lower than the list price".to_string());
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &ProductPatch::default()
    }
}

fn validate_product_fields(
    name: &str,
    slug: &str,
    brand: &str,
    price: f64,
    sale_price: Option<f64>,
    description: Option<&str>,
) -> Result<(), String> {
    let name_len = name.chars().count();
    if !(3..=255).contains(&name_len) {
        return Err("name must be between 3 and 255 characters".to_string());
    }
    if slug.trim().is_empty() {
        return Err("slug is required".to_string());
    }
    let brand_len = brand.chars().count();
    if !(1..=100).contains(&brand_len) {
        return Err("brand must be between 1 and 100 characters".to_string());
    }
    if price <= 0.0 {
        return Err("price must be greater than 0".to_string());
    }
    if let Some(sale_price) = sale_price {
        if sale_price <= 0.0 {
            return Err("sale price must be greater than 0".to_string());
        }
        if sale_price >= price {
            return Err("sale price must be lower than the list price".to_string());
        }
    }
    if let Some(description) = description {
        if description.chars().count() > 5000 {
            return Err("description is too long".to_string());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ModelId,
    pub quantity: i64,
    pub price_at_purchase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_info: CustomerInfo,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Order total derived from the line items. This is the single
    /// authoritative computation; callers never supply their own total.
    pub fn total_amount(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price_at_purchase * item.quantity as f64)
            .sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.customer_info.name.chars().count();
        if !(2..=100).contains(&name_len) {
            return Err("customer name must be between 2 and 100 characters".to_string());
        }
        if !PHONE_REGEX.is_match(&self.customer_info.phone) {
            return Err("phone must be 10-11 digits".to_string());
        }
        if let Some(email) = &self.customer_info.email {
            if !email.is_empty() && !EMAIL_REGEX.is_match(email) {
                return Err("invalid email address".to_string());
            }
        }
        let address = &self.customer_info.address;
        if address.street.chars().count() < 5 {
            return Err("street address must be at least 5 characters".to_string());
        }
        if address.ward.trim().is_empty()
            || address.district.trim().is_empty()
            || address.city.trim().is_empty()
        {
            return Err("ward, district and city are required".to_string());
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 500 {
                return Err("notes must be under 500 characters".to_string());
            }
        }
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        for item in &self.items {
            if item.quantity < 1 {
                return Err("item quantity must be at least 1".to_string());
            }
            if item.price_at_purchase < 0.0 {
                return Err("item price cannot be negative".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(price: f64, sale_price: Option<f64>) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Seiko 5 Sports".to_string(),
            slug: "seiko-5-sports".to_string(),
            brand: "Seiko".to_string(),
            price,
            sale_price,
            description: None,
            specs: None,
            image_url: None,
            images: vec![],
            stock_status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_new_order() -> NewOrder {
        NewOrder {
            customer_info: CustomerInfo {
                name: "Test Customer".to_string(),
                phone: "0912345678".to_string(),
                email: Some("test@example.com".to_string()),
                address: Address {
                    street: "123 Test Street".to_string(),
                    ward: "Ward 1".to_string(),
                    district: "District 1".to_string(),
                    city: "Test City".to_string(),
                },
            },
            payment_method: PaymentMethod::Cod,
            notes: None,
            items: vec![NewOrderItem {
                product_id: "p1".to_string(),
                quantity: 2,
                price_at_purchase: 80.0,
            }],
        }
    }

    #[test]
    fn test_effective_price_prefers_sale_price() {
        assert_eq!(test_product(100.0, Some(80.0)).effective_price(), 80.0);
        assert_eq!(test_product(100.0, None).effective_price(), 100.0);
    }

    #[test]
    fn test_status_and_payment_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
        assert_eq!("delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!("cod".parse::<PaymentMethod>(), Ok(PaymentMethod::Cod));
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_new_product_validation() {
        let mut product = NewProduct {
            name: "Seiko 5 Sports".to_string(),
            slug: "seiko-5-sports".to_string(),
            brand: "Seiko".to_string(),
            price: 100.0,
            sale_price: Some(80.0),
            description: None,
            specs: None,
            image_url: None,
            images: vec![],
            stock_status: true,
        };
        assert!(product.validate().is_ok());

        product.sale_price = Some(120.0);
        assert!(product.validate().is_err());

        product.sale_price = None;
        product.price = 0.0;
        assert!(product.validate().is_err());

        product.price = 100.0;
        product.name = "ab".to_string();
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_product_patch_clears_sale_price_only_when_present() {
        let patch: ProductPatch = serde_json::from_str(r#"{"sale_price": null}"#).unwrap();
        assert_eq!(patch.sale_price, Some(None));

        let patch: ProductPatch = serde_json::from_str(r#"{"price": 150.0}"#).unwrap();
        assert_eq!(patch.sale_price, None);
        assert_eq!(patch.price, Some(150.0));
    }

    #[test]
    fn test_patch_price_invariant_checked_against_stored_values() {
        let current = test_product(100.0, Some(80.0));

        // A sale price alone passes the per-field checks but must be caught
        // against the stored list price.
        let patch = ProductPatch {
            sale_price: Some(Some(150.0)),
            ..ProductPatch::default()
        };
        assert!(patch.validate().is_ok());
        assert!(patch.validate_merged_prices(&current).is_err());

        // Dropping the list price under the stored sale price is the same
        // breach from the other side.
        let patch = ProductPatch {
            price: Some(70.0),
            ..ProductPatch::default()
        };
        assert!(patch.validate_merged_prices(&current).is_err());

        let patch = ProductPatch {
            price: Some(70.0),
            sale_price: Some(None),
            ..ProductPatch::default()
        };
        assert!(patch.validate_merged_prices(&current).is_ok());
    }

    #[test]
    fn test_new_order_validation() {
        assert!(test_new_order().validate().is_ok());

        let mut order = test_new_order();
        order.items.clear();
        assert!(order.validate().is_err());

        let mut order = test_new_order();
        order.items[0].quantity = 0;
        assert!(order.validate().is_err());

        let mut order = test_new_order();
        order.customer_info.phone = "12345".to_string();
        assert!(order.validate().is_err());

        let mut order = test_new_order();
        order.customer_info.email = Some("".to_string());
        assert!(order.validate().is_ok());

        let mut order = test_new_order();
        order.customer_info.email = Some("not-an-email".to_string());
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_order_total_derived_from_items() {
        let mut order = test_new_order();
        order.items.push(NewOrderItem {
            product_id: "p2".to_string(),
            quantity: 1,
            price_at_purchase: 40.0,
        });
        assert_eq!(order.total_amount(), 200.0);
    }
}

use crate::model::Product;
use serde::{Deserialize, Serialize};

/// One cart line, aggregating quantity for a single product. The unit price
/// is the product's effective price captured at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub unit_price: f64,
    pub image_url: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartState {
    /// Line items in insertion order, at most one per product id.
    pub items: Vec<CartItem>,
    /// Cart drawer visibility, independent of the items.
    pub is_open: bool,
}

impl CartState {
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.unit_price * item.quantity as f64)
            .sum()
    }
}

type Subscriber = Box<dyn Fn(&CartState)>;

/// Explicit state container for the shopping cart: single writer, many
/// readers, synchronous mutation, derived values recomputed on read.
/// Subscribers are notified after every mutation.
#[derive(Default)]
pub struct CartStore {
    state: CartState,
    subscribers: Vec<Subscriber>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    /// Sum of quantities across all lines.
    pub fn count(&self) -> u32 {
        self.state.count()
    }

    /// Sum of unit price times quantity across all lines.
    pub fn total(&self) -> f64 {
        self.state.total()
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&CartState) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Add a product to the cart. An existing line for the same product has
    /// its quantity increased; otherwise a new line is appended. Adding a
    /// zero quantity is a no-op.
    pub fn add_item(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self
            .state
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.state.items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                brand: product.brand.clone(),
                unit_price: product.effective_price(),
                image_url: product.image_url.clone(),
                quantity,
            }),
        }
        self.notify();
    }

    /// Remove a line by product id. Silent no-op if absent.
    pub fn remove_item(&mut self, product_id: &str) {
        let before = self.state.items.len();
        self.state.items.retain(|item| item.product_id != product_id);
        if self.state.items.len() != before {
            self.notify();
        }
    }

    /// Set a line's quantity. A quantity of zero or less removes the line;
    /// non-positive quantities are never stored and values above `u32::MAX`
    /// saturate. Silent no-op for an unknown product id.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self
            .state
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            self.notify();
        }
    }

    /// Empty the cart. Used after a confirmed order placement.
    pub fn clear(&mut self) {
        self.state.items.clear();
        self.notify();
    }

    pub fn toggle_open(&mut self) {
        self.state.is_open = !self.state.is_open;
        self.notify();
    }

    pub fn open(&mut self) {
        self.state.is_open = true;
        self.notify();
    }

    pub fn close(&mut self) {
        self.state.is_open = false;
        self.notify();
    }

    fn notify(&self) {
        for subscriber in &self.subscribers {
            subscriber(&self.state);
        }
    }
}

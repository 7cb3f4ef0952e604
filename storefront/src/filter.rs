use crate::model::Product;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    /// None means unbounded.
    pub max: Option<f64>,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 0.0, max: None }
    }
}

/// Product-listing filter predicate state, independent of the product data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub selected_brands: BTreeSet<String>,
    pub price_range: PriceRange,
    pub search_query: String,
}

impl FilterState {
    /// True when any predicate component constrains the product list.
    pub fn has_active_filters(&self) -> bool {
        !self.selected_brands.is_empty()
            || self.price_range.min > 0.0
            || self.price_range.max.is_some()
            || !self.search_query.is_empty()
    }

    /// A product passes when the search query matches its name
    /// (case-insensitive containment), its brand is selected (or no brand is
    /// selected), and its effective price falls within the range. The three
    /// predicates are AND-combined; an empty predicate passes everything.
    pub fn matches(&self, product: &Product) -> bool {
        if !self.search_query.is_empty() {
            let query = self.search_query.to_lowercase();
            if !product.name.to_lowercase().contains(&query) {
                return false;
            }
        }
        if !self.selected_brands.is_empty() && !self.selected_brands.contains(&product.brand) {
            return false;
        }
        let price = product.effective_price();
        if price < self.price_range.min {
            return false;
        }
        if let Some(max) = self.price_range.max {
            if price > max {
                return false;
            }
        }
        true
    }
}

type Subscriber = Box<dyn Fn(&FilterState)>;

/// State container for the listing filters, with the same mutation API and
/// subscription contract as the cart store.
#[derive(Default)]
pub struct FilterStore {
    state: FilterState,
    subscribers: Vec<Subscriber>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn selected_brands(&self) -> &BTreeSet<String> {
        &self.state.selected_brands
    }

    pub fn price_range(&self) -> &PriceRange {
        &self.state.price_range
    }

    pub fn search_query(&self) -> &str {
        &self.state.search_query
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&FilterState) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Symmetric difference: add the brand if absent, remove it if present.
    pub fn toggle_brand(&mut self, brand: &str) {
        if !self.state.selected_brands.remove(brand) {
            self.state.selected_brands.insert(brand.to_string());
        }
        self.notify();
    }

    /// Replace the selection wholesale.
    pub fn set_brands<I, S>(&mut self, brands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.selected_brands = brands.into_iter().map(Into::into).collect();
        self.notify();
    }

    /// Partial update: a `None` argument keeps the previous value. Passing
    /// `Some(None)` for max clears the upper bound.
    pub fn set_price_range(&mut self, min: Option<f64>, max: Option<Option<f64>>) {
        if let Some(min) = min {
            self.state.price_range.min = min;
        }
        if let Some(max) = max {
            self.state.price_range.max = max;
        }
        self.notify();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.state.search_query = query.to_string();
        self.notify();
    }

    /// Reset to the empty predicate: no brands, {0, unbounded}, empty query.
    pub fn clear_filters(&mut self) {
        self.state = FilterState::default();
        self.notify();
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.state.matches(product)
    }

    /// Apply the predicate to a product collection.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    fn notify(&self) {
        for subscriber in &self.subscribers {
            subscriber(&self.state);
        }
    }
}

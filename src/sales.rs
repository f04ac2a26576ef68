//! Denormalized sales fact table
//!
//! One row per order item, joined to its order, product and customer, with
//! calendar components derived from the purchase timestamp.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::{MetricsError, Result};
use crate::models::{Customer, Order, OrderItem, OrderStatus, Product};
use crate::registry::DatasetRegistry;

/// Category assigned when the product is unknown or has no category
pub const UNCLASSIFIED_CATEGORY: &str = "unclassified";
/// State and city assigned when the order's customer is unknown
pub const UNKNOWN_LOCATION: &str = "unknown";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalesFact {
    pub order_id: String,
    pub item_seq: u32,
    pub product_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchased_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
    pub estimated_delivery_at: Option<NaiveDateTime>,
    pub price: f64,
    pub freight_value: f64,
    pub category: String,
    pub customer_state: String,
    pub customer_city: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub quarter: Option<u32>,
}

impl SalesFact {
    /// Line revenue: item price plus freight
    pub fn revenue(&self) -> f64 {
        self.price + self.freight_value
    }

    pub fn is_dated(&self) -> bool {
        self.year.is_some()
    }
}

/// An immutable view over fact rows. Filtering produces a new table.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SalesFactTable {
    rows: Vec<SalesFact>,
}

impl SalesFactTable {
    pub fn new(rows: Vec<SalesFact>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SalesFact] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows without a purchase timestamp; these never reach a time-based metric
    pub fn undated_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_dated()).count()
    }

    /// New table holding the rows that satisfy `predicate`, in input order
    pub fn retain(&self, predicate: impl Fn(&SalesFact) -> bool) -> Self {
        Self {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }
}

/// Joins the source tables of a registry into a [`SalesFactTable`].
pub struct SalesFactBuilder<'a> {
    orders: &'a [Order],
    items: &'a [OrderItem],
    products: &'a [Product],
    customers: &'a [Customer],
}

impl<'a> SalesFactBuilder<'a> {
    pub fn new(orders: &'a [Order], items: &'a [OrderItem]) -> Self {
        Self {
            orders,
            items,
            products: &[],
            customers: &[],
        }
    }

    pub fn from_registry(registry: &'a DatasetRegistry) -> Self {
        Self::new(registry.orders(), registry.order_items())
            .with_products(registry.products())
            .with_customers(registry.customers())
    }

    pub fn with_products(mut self, products: &'a [Product]) -> Self {
        self.products = products;
        self
    }

    pub fn with_customers(mut self, customers: &'a [Customer]) -> Self {
        self.customers = customers;
        self
    }

    /// Fails with `MissingOrderReference` on the first item whose order is absent.
    pub fn build(&self) -> Result<SalesFactTable> {
        let orders: HashMap<&str, &Order> =
            self.orders.iter().map(|o| (o.order_id.as_str(), o)).collect();
        let categories: HashMap<&str, Option<&str>> = self
            .products
            .iter()
            .map(|p| (p.product_id.as_str(), p.category.as_deref()))
            .collect();
        let customers: HashMap<&str, &Customer> = self
            .customers
            .iter()
            .map(|c| (c.customer_id.as_str(), c))
            .collect();

        let mut rows = Vec::with_capacity(self.items.len());
        let mut unclassified = 0usize;
        let mut unknown_customers = 0usize;

        for item in self.items {
            let order = orders.get(item.order_id.as_str()).ok_or_else(|| {
                MetricsError::MissingOrderReference {
                    source_table: "order_items",
                    order_id: item.order_id.clone(),
                }
            })?;

            let category = match categories.get(item.product_id.as_str()) {
                Some(Some(category)) => category.to_string(),
                _ => {
                    unclassified += 1;
                    UNCLASSIFIED_CATEGORY.to_string()
                }
            };

            let (customer_state, customer_city) = match customers.get(order.customer_id.as_str()) {
                Some(c) => (c.state.clone(), c.city.clone()),
                None => {
                    unknown_customers += 1;
                    (UNKNOWN_LOCATION.to_string(), UNKNOWN_LOCATION.to_string())
                }
            };

            let purchased_at = order.purchased_at;
            rows.push(SalesFact {
                order_id: item.order_id.clone(),
                item_seq: item.item_seq,
                product_id: item.product_id.clone(),
                customer_id: order.customer_id.clone(),
                status: order.status,
                purchased_at,
                delivered_at: order.delivered_at,
                estimated_delivery_at: order.estimated_delivery_at,
                price: item.price,
                freight_value: item.freight_value,
                category,
                customer_state,
                customer_city,
                year: purchased_at.map(|ts| ts.year()),
                month: purchased_at.map(|ts| ts.month()),
                quarter: purchased_at.map(|ts| (ts.month() - 1) / 3 + 1),
            });
        }

        let table = SalesFactTable::new(rows);
        let undated = table.undated_rows();

        info!("Built sales fact table with {} rows", table.len());
        if undated > 0 {
            warn!(
                "{} fact rows have no purchase timestamp and are excluded from time-based metrics",
                undated
            );
        }
        if unclassified > 0 {
            debug!("{} fact rows fell back to the '{}' category", unclassified, UNCLASSIFIED_CATEGORY);
        }
        if unknown_customers > 0 {
            warn!("{} fact rows reference an unknown customer", unknown_customers);
        }
        let duplicates = duplicate_item_keys(self.items);
        if duplicates > 0 {
            warn!("{} order items repeat an (order_id, item_seq) key", duplicates);
        }

        Ok(table)
    }
}

/// Number of items whose `(order_id, item_seq)` was already seen earlier in `items`.
pub fn duplicate_item_keys(items: &[OrderItem]) -> usize {
    let mut seen: HashSet<(&str, u32)> = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| !seen.insert((item.order_id.as_str(), item.item_seq)))
        .count()
}

/// Check that every review points at an existing order.
pub fn validate_reviews(registry: &DatasetRegistry) -> Result<()> {
    let known: HashSet<&str> = registry
        .orders()
        .iter()
        .map(|o| o.order_id.as_str())
        .collect();

    match registry
        .reviews()
        .iter()
        .find(|r| !known.contains(r.order_id.as_str()))
    {
        Some(review) => Err(MetricsError::MissingOrderReference {
            source_table: "reviews",
            order_id: review.order_id.clone(),
        }),
        None => Ok(()),
    }
}

//! In-memory holder for the five source tables

use crate::models::{Customer, Order, OrderItem, Product, Review};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Logical name of a source table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Orders,
    OrderItems,
    Products,
    Customers,
    Reviews,
}

impl TableName {
    pub const ALL: [TableName; 5] = [
        TableName::Orders,
        TableName::OrderItems,
        TableName::Products,
        TableName::Customers,
        TableName::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Orders => "orders",
            TableName::OrderItems => "order_items",
            TableName::Products => "products",
            TableName::Customers => "customers",
            TableName::Reviews => "reviews",
        }
    }

    /// File name of the table in the public dataset layout
    pub fn file_name(&self) -> &'static str {
        match self {
            TableName::Orders => "orders_dataset.csv",
            TableName::OrderItems => "order_items_dataset.csv",
            TableName::Products => "products_dataset.csv",
            TableName::Customers => "customers_dataset.csv",
            TableName::Reviews => "order_reviews_dataset.csv",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-table ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub loaded: usize,
    /// Rows that failed to parse or convert
    pub skipped: usize,
    /// Parsed rows dropped because their order was skipped
    pub orphaned: usize,
}

/// The loaded tables of one analysis run. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    products: Vec<Product>,
    customers: Vec<Customer>,
    reviews: Vec<Review>,
    load_stats: BTreeMap<TableName, LoadStats>,
}

impl DatasetRegistry {
    pub fn new(
        orders: Vec<Order>,
        order_items: Vec<OrderItem>,
        products: Vec<Product>,
        customers: Vec<Customer>,
        reviews: Vec<Review>,
    ) -> Self {
        Self {
            orders,
            order_items,
            products,
            customers,
            reviews,
            load_stats: BTreeMap::new(),
        }
    }

    /// Attach the ingestion counters of the tables that came from files.
    pub fn with_load_stats(mut self, stats: BTreeMap<TableName, LoadStats>) -> Self {
        self.load_stats = stats;
        self
    }

    /// `None` for tables that were not loaded from a file
    pub fn load_stats(&self, table: TableName) -> Option<LoadStats> {
        self.load_stats.get(&table).copied()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn row_count(&self, table: TableName) -> usize {
        match table {
            TableName::Orders => self.orders.len(),
            TableName::OrderItems => self.order_items.len(),
            TableName::Products => self.products.len(),
            TableName::Customers => self.customers.len(),
            TableName::Reviews => self.reviews.len(),
        }
    }
}

//! E-commerce business metrics
//!
//! Joins orders, order items, products, customers and reviews into a sales
//! fact table, filters it to a period, and computes revenue, category,
//! geographic and customer-experience metrics.

pub mod config;
pub mod delivery;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod sales;
pub mod stats;

pub use config::{AnalysisConfig, MonthRange};
pub use error::MetricsError;
pub use pipeline::{run_analysis, AnalysisReport};
pub use registry::{DatasetRegistry, TableName};
pub use sales::{SalesFact, SalesFactBuilder, SalesFactTable};

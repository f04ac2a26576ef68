//! CSV ingestion of the five source tables
//!
//! Rows that fail to parse are skipped and counted; the first few failures per
//! table are logged with their reason. Items and reviews of a skipped order are
//! dropped with it so the remaining tables stay consistent.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::models::{
    CustomerCsvRecord, OrderCsvRecord, OrderItemCsvRecord, ProductCsvRecord, ReviewCsvRecord,
};
use crate::registry::{DatasetRegistry, TableName};

pub use crate::registry::LoadStats;

const MAX_LOGGED_ERRORS: usize = 5;

/// Read every table from `data_dir` using the standard file names.
pub fn load_datasets(data_dir: impl AsRef<Path>) -> Result<DatasetRegistry> {
    let dir = data_dir.as_ref();
    info!("Loading datasets from {:?}", dir);

    let skipped_orders: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
    let (orders, order_stats) = load_table(dir, TableName::Orders, |r: OrderCsvRecord| {
        r.to_order().map_err(|e| {
            skipped_orders.borrow_mut().insert(r.order_id.clone());
            e
        })
    })?;
    let skipped_orders = skipped_orders.into_inner();

    let (mut order_items, mut item_stats) =
        load_table(dir, TableName::OrderItems, |r: OrderItemCsvRecord| r.to_order_item())?;
    item_stats.orphaned = drop_orphans(&mut order_items, &skipped_orders, TableName::OrderItems, |i| {
        i.order_id.as_str()
    });

    let (products, product_stats) =
        load_table(dir, TableName::Products, |r: ProductCsvRecord| Ok(r.to_product()))?;
    let (customers, customer_stats) =
        load_table(dir, TableName::Customers, |r: CustomerCsvRecord| Ok(r.to_customer()))?;

    let (mut reviews, mut review_stats) =
        load_table(dir, TableName::Reviews, |r: ReviewCsvRecord| r.to_review())?;
    review_stats.orphaned = drop_orphans(&mut reviews, &skipped_orders, TableName::Reviews, |r| {
        r.order_id.as_str()
    });

    let stats = BTreeMap::from([
        (TableName::Orders, order_stats),
        (TableName::OrderItems, item_stats),
        (TableName::Products, product_stats),
        (TableName::Customers, customer_stats),
        (TableName::Reviews, review_stats),
    ]);

    Ok(DatasetRegistry::new(
        orders,
        order_items,
        products,
        customers,
        reviews,
    )
    .with_load_stats(stats))
}

/// Remove rows whose order was skipped; returns how many were removed.
fn drop_orphans<T>(
    rows: &mut Vec<T>,
    skipped_orders: &HashSet<String>,
    table: TableName,
    order_id: impl Fn(&T) -> &str,
) -> usize {
    if skipped_orders.is_empty() {
        return 0;
    }
    let before = rows.len();
    rows.retain(|row| !skipped_orders.contains(order_id(row)));
    let dropped = before - rows.len();
    if dropped > 0 {
        warn!(
            "Dropped {} {} rows belonging to {} skipped orders",
            dropped,
            table,
            skipped_orders.len()
        );
    }
    dropped
}

/// Deserialize one table, converting each raw record with `convert`.
pub fn load_table<R, T, F>(dir: &Path, table: TableName, convert: F) -> Result<(Vec<T>, LoadStats)>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T>,
{
    let path = dir.join(table.file_name());
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("failed to open {} table at {:?}", table, path))?;

    let mut rows = Vec::new();
    let mut stats = LoadStats::default();

    for (i, record) in reader.deserialize::<R>().enumerate() {
        let converted = record
            .map_err(anyhow::Error::from)
            .and_then(&convert);
        match converted {
            Ok(row) => {
                rows.push(row);
                stats.loaded += 1;
            }
            Err(e) => {
                if stats.skipped < MAX_LOGGED_ERRORS {
                    warn!("Skipping {} record {}: {}", table, i, e);
                }
                stats.skipped += 1;
            }
        }
    }

    info!(
        "Loaded {}: {} rows, {} skipped",
        table, stats.loaded, stats.skipped
    );

    Ok((rows, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TableName::Reviews.file_name()),
            "review_id,order_id,review_score,review_creation_date\n\
             r1,o1,5,2023-01-11 00:00:00\n\
             r2,o2,9,2023-01-11 00:00:00\n\
             r3,o3,,\n",
        )
        .unwrap();

        let (reviews, stats) =
            load_table(dir.path(), TableName::Reviews, |r: ReviewCsvRecord| r.to_review())
                .unwrap();

        assert_eq!(stats, LoadStats { loaded: 2, skipped: 1, orphaned: 0 });
        assert_eq!(reviews[0].score, Some(5));
        assert_eq!(reviews[1].score, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_table(dir.path(), TableName::Products, |r: ProductCsvRecord| {
            Ok(r.to_product())
        });
        assert!(result.is_err());
    }
}

//! Synthetic data generator for the e-commerce dataset
//!
//! Writes the five dataset CSV files with random but plausible orders:
//! lifecycle timestamps consistent with the order status, multi-item orders,
//! skewed category and state popularity, and review scores that drop as
//! deliveries run late.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --orders <N>        Number of orders (default: 5000)
//!   --start-year <Y>    First purchase year (default: 2022)
//!   --years <N>         Number of years covered (default: 2)
//!   --seed <N>          Random seed for reproducibility (optional)
//!   --output-dir <PATH> Output directory (default: ecommerce_data)

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use csv::WriterBuilder;
use ecommerce_metrics::models::{
    CustomerCsvRecord, OrderCsvRecord, OrderItemCsvRecord, OrderStatus, ProductCsvRecord,
    ReviewCsvRecord, TIMESTAMP_FORMAT,
};
use ecommerce_metrics::TableName;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic e-commerce dataset")]
struct Args {
    /// Number of orders to generate
    #[arg(long, default_value = "5000")]
    orders: usize,

    /// First purchase year
    #[arg(long, default_value = "2022")]
    start_year: i32,

    /// Number of consecutive years covered
    #[arg(long, default_value = "2")]
    years: i32,

    /// Number of products in the catalog
    #[arg(long, default_value = "400")]
    products: usize,

    /// Share of products without a category (0.0 - 1.0)
    #[arg(long, default_value = "0.02")]
    uncategorized_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "ecommerce_data")]
    output_dir: PathBuf,
}

/// Categories with relative popularity weights
const CATEGORIES: &[(&str, u32)] = &[
    ("bed_bath_table", 18),
    ("health_beauty", 16),
    ("sports_leisure", 14),
    ("furniture_decor", 12),
    ("computers_accessories", 11),
    ("housewares", 10),
    ("watches_gifts", 9),
    ("telephony", 7),
    ("garden_tools", 6),
    ("auto", 6),
    ("toys", 5),
    ("cool_stuff", 4),
    ("perfumery", 4),
    ("baby", 3),
    ("electronics", 3),
];

/// (state, city, weight)
const LOCATIONS: &[(&str, &str, u32)] = &[
    ("SP", "sao paulo", 42),
    ("RJ", "rio de janeiro", 13),
    ("MG", "belo horizonte", 12),
    ("RS", "porto alegre", 6),
    ("PR", "curitiba", 5),
    ("SC", "florianopolis", 4),
    ("BA", "salvador", 3),
    ("DF", "brasilia", 2),
    ("ES", "vitoria", 2),
    ("GO", "goiania", 2),
    ("PE", "recife", 2),
    ("CE", "fortaleza", 1),
    ("PA", "belem", 1),
    ("AM", "manaus", 1),
];

/// Final status with relative weight
const STATUSES: &[(OrderStatus, u32)] = &[
    (OrderStatus::Delivered, 940),
    (OrderStatus::Shipped, 15),
    (OrderStatus::Canceled, 8),
    (OrderStatus::Unavailable, 7),
    (OrderStatus::Invoiced, 4),
    (OrderStatus::Processing, 4),
    (OrderStatus::Created, 1),
    (OrderStatus::Approved, 1),
];

fn weighted<'a, T>(items: &'a [T], weight: impl Fn(&T) -> u32, rng: &mut impl Rng) -> &'a T {
    let total: u32 = items.iter().map(&weight).sum();
    let mut pick = rng.gen_range(0..total);
    for item in items {
        let w = weight(item);
        if pick < w {
            return item;
        }
        pick -= w;
    }
    &items[items.len() - 1]
}

fn generate_id(rng: &mut impl Rng) -> String {
    format!("{:032x}", rng.gen::<u128>())
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn random_purchase(start_year: i32, years: i32, rng: &mut impl Rng) -> NaiveDateTime {
    let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(start_year + years, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let span = (end - start).num_seconds().max(1);
    start + Duration::seconds(rng.gen_range(0..span))
}

/// Review score falls as delivery overshoots the estimate
fn review_score(days_late: Option<i64>, rng: &mut impl Rng) -> u8 {
    let base: f64 = match days_late {
        Some(late) if late > 7 => 1.8,
        Some(late) if late > 0 => 3.0,
        Some(_) => 4.4,
        None => 2.5,
    };
    let noisy = base + rng.gen_range(-1.2..1.2);
    noisy.round().clamp(1.0, 5.0) as u8
}

fn write_table<T: Serialize>(dir: &Path, table: TableName, rows: &[T]) -> Result<()> {
    let path = dir.join(table.file_name());
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("failed to create {:?}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();
    if args.products == 0 || args.years < 1 {
        bail!("need at least one product and one year");
    }

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&args.output_dir)?;

    // Catalog
    let products: Vec<ProductCsvRecord> = (0..args.products)
        .map(|_| {
            let category = if rng.gen::<f64>() < args.uncategorized_rate {
                None
            } else {
                Some(weighted(CATEGORIES, |c| c.1, &mut rng).0.to_string())
            };
            ProductCsvRecord {
                product_id: generate_id(&mut rng),
                product_category_name: category,
            }
        })
        .collect();

    let mut orders = Vec::with_capacity(args.orders);
    let mut items = Vec::new();
    let mut customers = Vec::with_capacity(args.orders);
    let mut reviews = Vec::new();

    for i in 0..args.orders {
        let customer_id = generate_id(&mut rng);
        let (state, city, _) = *weighted(LOCATIONS, |l| l.2, &mut rng);
        customers.push(CustomerCsvRecord {
            customer_id: customer_id.clone(),
            customer_city: city.to_string(),
            customer_state: state.to_string(),
        });

        let status = weighted(STATUSES, |s| s.1, &mut rng).0;
        let purchased = random_purchase(args.start_year, args.years, &mut rng);
        let approved = (status != OrderStatus::Created)
            .then(|| purchased + Duration::minutes(rng.gen_range(5..2880)));
        let estimated = purchased + Duration::days(rng.gen_range(10..35));
        let delivered = (status == OrderStatus::Delivered)
            .then(|| purchased + Duration::hours(rng.gen_range(24..24 * 40)));

        let order_id = generate_id(&mut rng);
        orders.push(OrderCsvRecord {
            order_id: order_id.clone(),
            customer_id,
            order_status: status.as_str().to_string(),
            order_purchase_timestamp: Some(format_datetime(&purchased)),
            order_approved_at: approved.as_ref().map(format_datetime),
            order_delivered_customer_date: delivered.as_ref().map(format_datetime),
            order_estimated_delivery_date: Some(estimated.date().format("%Y-%m-%d 00:00:00").to_string()),
        });

        let item_count = if rng.gen::<f64>() < 0.9 { 1 } else { rng.gen_range(2..=4) };
        for seq in 1..=item_count {
            let product = &products[rng.gen_range(0..products.len())];
            let price = (rng.gen_range(2.0f64..6.5).exp() * 100.0).round() / 100.0;
            let freight = (rng.gen_range(5.0..45.0f64) * 100.0).round() / 100.0;
            items.push(OrderItemCsvRecord {
                order_id: order_id.clone(),
                order_item_id: seq,
                product_id: product.product_id.clone(),
                price,
                freight_value: freight,
            });
        }

        if status == OrderStatus::Delivered || rng.gen_bool(0.5) {
            let days_late = delivered.map(|d| (d - estimated).num_days());
            let reviewed_at = delivered.unwrap_or(estimated) + Duration::days(1);
            reviews.push(ReviewCsvRecord {
                order_id: order_id.clone(),
                review_score: Some(review_score(days_late, &mut rng)),
                review_creation_date: Some(format_datetime(&reviewed_at)),
            });
        }

        if (i + 1) % 10000 == 0 {
            info!("Generated {}/{} orders...", i + 1, args.orders);
        }
    }

    write_table(&args.output_dir, TableName::Orders, &orders)?;
    write_table(&args.output_dir, TableName::OrderItems, &items)?;
    write_table(&args.output_dir, TableName::Products, &products)?;
    write_table(&args.output_dir, TableName::Customers, &customers)?;
    write_table(&args.output_dir, TableName::Reviews, &reviews)?;

    info!(
        "Generation complete: {} orders, {} items, {} reviews in {}",
        orders.len(),
        items.len(),
        reviews.len(),
        args.output_dir.display()
    );

    Ok(())
}

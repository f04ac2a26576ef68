//! Business metrics over a filtered sales fact table
//!
//! Each group is computed independently and never fails: an empty table gives
//! zero counts and `None` for every ratio.

pub mod category;
pub mod experience;
pub mod geography;
pub mod revenue;

use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet};

use crate::delivery::DeliveryRecords;
use crate::models::{Order, OrderStatus};
use crate::sales::{SalesFact, SalesFactTable};

pub use category::{CategoryMetrics, CategoryPerformance};
pub use experience::ExperienceMetrics;
pub use geography::{GeographicMetrics, StatePerformance};
pub use revenue::{RevenueMetrics, YearRevenue};

/// Stateless calculator borrowing one fact table.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCalculator<'a> {
    fact: &'a SalesFactTable,
}

impl<'a> MetricsCalculator<'a> {
    pub fn new(fact: &'a SalesFactTable) -> Self {
        Self { fact }
    }

    pub fn fact(&self) -> &'a SalesFactTable {
        self.fact
    }

    pub fn calculate_revenue_metrics(
        &self,
        primary_year: i32,
        comparison_year: Option<i32>,
    ) -> RevenueMetrics {
        revenue::calculate(self.fact, primary_year, comparison_year)
    }

    pub fn calculate_category_metrics(&self) -> CategoryMetrics {
        category::calculate(self.fact)
    }

    pub fn calculate_geographic_metrics(&self, top_n: Option<usize>) -> GeographicMetrics {
        geography::calculate(self.fact, top_n)
    }

    pub fn calculate_customer_experience_metrics(
        &self,
        deliveries: &DeliveryRecords,
    ) -> ExperienceMetrics {
        experience::calculate(self.fact, deliveries)
    }
}

/// Percentage of orders per status, optionally restricted to a purchase year.
///
/// Orders without a purchase timestamp only count when no year is given.
pub fn order_status_distribution(orders: &[Order], year: Option<i32>) -> BTreeMap<OrderStatus, f64> {
    let mut counts: BTreeMap<OrderStatus, usize> = BTreeMap::new();
    let mut total = 0usize;

    for order in orders {
        if let Some(year) = year {
            if order.purchased_at.map(|ts| ts.year()) != Some(year) {
                continue;
            }
        }
        *counts.entry(order.status).or_default() += 1;
        total += 1;
    }

    counts
        .into_iter()
        .map(|(status, count)| (status, count as f64 / total as f64 * 100.0))
        .collect()
}

/// Running totals for one group key
#[derive(Debug, Default)]
pub(crate) struct GroupTotals<'a> {
    pub revenue: f64,
    pub price_total: f64,
    pub items: usize,
    pub orders: BTreeSet<&'a str>,
    pub customers: BTreeSet<&'a str>,
}

/// Group rows by `key`, keeping input order within each group's sums.
pub(crate) fn group_rows<'a>(
    rows: &'a [SalesFact],
    key: impl Fn(&'a SalesFact) -> &'a str,
) -> BTreeMap<&'a str, GroupTotals<'a>> {
    let mut groups: BTreeMap<&'a str, GroupTotals<'a>> = BTreeMap::new();
    for row in rows {
        let totals = groups.entry(key(row)).or_default();
        totals.revenue += row.revenue();
        totals.price_total += row.price;
        totals.items += 1;
        totals.orders.insert(row.order_id.as_str());
        totals.customers.insert(row.customer_id.as_str());
    }
    groups
}

/// Groups sorted by revenue descending, ties by key ascending
pub(crate) fn ranked<'a>(groups: BTreeMap<&'a str, GroupTotals<'a>>) -> Vec<(&'a str, GroupTotals<'a>)> {
    let mut ranked: Vec<_> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.revenue.total_cmp(&a.1.revenue).then_with(|| a.0.cmp(b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order(id: &str, status: OrderStatus, year: Option<i32>) -> Order {
        Order {
            order_id: id.into(),
            customer_id: "c".into(),
            status,
            purchased_at: year.map(|y| {
                NaiveDate::from_ymd_opt(y, 3, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            }),
            approved_at: None,
            delivered_at: None,
            estimated_delivery_at: None,
        }
    }

    #[test]
    fn status_distribution_by_year() {
        let orders = vec![
            order("a", OrderStatus::Delivered, Some(2023)),
            order("b", OrderStatus::Delivered, Some(2023)),
            order("c", OrderStatus::Canceled, Some(2023)),
            order("d", OrderStatus::Shipped, Some(2022)),
            order("e", OrderStatus::Created, None),
        ];

        let dist = order_status_distribution(&orders, Some(2023));
        assert_eq!(dist.len(), 2);
        assert!((dist[&OrderStatus::Delivered] - 200.0 / 3.0).abs() < 1e-9);

        let all = order_status_distribution(&orders, None);
        assert!((all[&OrderStatus::Created] - 20.0).abs() < 1e-9);
        assert!(order_status_distribution(&[], Some(2023)).is_empty());
    }
}

use serde::Serialize;
use std::collections::BTreeSet;

use crate::sales::SalesFactTable;
use crate::stats::{growth_pct, ratio};

/// Totals for one calendar year
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearRevenue {
    pub year: i32,
    pub revenue: f64,
    pub order_count: usize,
    /// Revenue per distinct order; `None` without orders
    pub avg_order_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueMetrics {
    pub primary: YearRevenue,
    pub comparison: Option<YearRevenue>,
    /// Primary minus comparison revenue
    pub absolute_growth: Option<f64>,
    /// `None` without a comparison year or when its revenue is zero
    pub revenue_growth_pct: Option<f64>,
    pub orders_growth_pct: Option<f64>,
    pub aov_growth_pct: Option<f64>,
    /// Revenue of the primary year per month, January first
    pub monthly_revenue: [f64; 12],
    /// Growth over the previous month; January and months after an empty month are `None`
    pub monthly_growth_pct: [Option<f64>; 12],
}

fn year_revenue(fact: &SalesFactTable, year: i32) -> YearRevenue {
    let mut revenue = 0.0;
    let mut orders: BTreeSet<&str> = BTreeSet::new();

    for row in fact.rows().iter().filter(|r| r.year == Some(year)) {
        revenue += row.revenue();
        orders.insert(row.order_id.as_str());
    }

    YearRevenue {
        year,
        revenue,
        order_count: orders.len(),
        avg_order_value: ratio(revenue, orders.len() as f64),
    }
}

fn monthly_revenue(fact: &SalesFactTable, year: i32) -> [f64; 12] {
    let mut months = [0.0; 12];
    for row in fact.rows().iter().filter(|r| r.year == Some(year)) {
        if let Some(month) = row.month {
            months[(month - 1) as usize] += row.revenue();
        }
    }
    months
}

fn month_over_month(months: &[f64; 12]) -> [Option<f64>; 12] {
    let mut growth = [None; 12];
    for i in 1..12 {
        growth[i] = growth_pct(months[i], months[i - 1]);
    }
    growth
}

pub fn calculate(fact: &SalesFactTable, primary_year: i32, comparison_year: Option<i32>) -> RevenueMetrics {
    let primary = year_revenue(fact, primary_year);
    let comparison = comparison_year.map(|year| year_revenue(fact, year));

    let (absolute_growth, revenue_growth_pct, orders_growth_pct, aov_growth_pct) = match &comparison {
        Some(base) => (
            Some(primary.revenue - base.revenue),
            growth_pct(primary.revenue, base.revenue),
            growth_pct(primary.order_count as f64, base.order_count as f64),
            match (primary.avg_order_value, base.avg_order_value) {
                (Some(current), Some(previous)) => growth_pct(current, previous),
                _ => None,
            },
        ),
        None => (None, None, None, None),
    };

    let monthly_revenue = monthly_revenue(fact, primary_year);
    let monthly_growth_pct = month_over_month(&monthly_revenue);

    RevenueMetrics {
        primary,
        comparison,
        absolute_growth,
        revenue_growth_pct,
        orders_growth_pct,
        aov_growth_pct,
        monthly_revenue,
        monthly_growth_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::sales::SalesFact;

    fn row(order_id: &str, year: i32, month: u32, price: f64, freight: f64) -> SalesFact {
        SalesFact {
            order_id: order_id.into(),
            item_seq: 1,
            product_id: "p".into(),
            customer_id: "c".into(),
            status: OrderStatus::Delivered,
            purchased_at: None,
            delivered_at: None,
            estimated_delivery_at: None,
            price,
            freight_value: freight,
            category: "x".into(),
            customer_state: "SP".into(),
            customer_city: "x".into(),
            year: Some(year),
            month: Some(month),
            quarter: Some((month - 1) / 3 + 1),
        }
    }

    #[test]
    fn totals_and_growth() {
        let fact = SalesFactTable::new(vec![
            row("a", 2023, 1, 100.0, 10.0),
            row("a", 2023, 1, 40.0, 0.0),
            row("b", 2023, 3, 50.0, 0.0),
            row("z", 2022, 5, 80.0, 20.0),
        ]);

        let m = calculate(&fact, 2023, Some(2022));
        assert_eq!(m.primary.revenue, 200.0);
        assert_eq!(m.primary.order_count, 2);
        assert_eq!(m.primary.avg_order_value, Some(100.0));
        assert_eq!(m.absolute_growth, Some(100.0));
        assert_eq!(m.revenue_growth_pct, Some(100.0));
        assert_eq!(m.orders_growth_pct, Some(100.0));
        assert_eq!(m.aov_growth_pct, Some(0.0));
    }

    #[test]
    fn monthly_series_has_twelve_entries_with_zeros() {
        let fact = SalesFactTable::new(vec![
            row("a", 2023, 1, 100.0, 0.0),
            row("b", 2023, 2, 150.0, 0.0),
            row("c", 2023, 4, 30.0, 0.0),
        ]);

        let m = calculate(&fact, 2023, None);
        assert_eq!(m.monthly_revenue[0], 100.0);
        assert_eq!(m.monthly_revenue[2], 0.0);
        assert_eq!(m.monthly_revenue[11], 0.0);
        assert_eq!(m.monthly_growth_pct[0], None);
        assert_eq!(m.monthly_growth_pct[1], Some(50.0));
        assert_eq!(m.monthly_growth_pct[2], Some(-100.0));
        assert_eq!(m.monthly_growth_pct[3], None);
        assert_eq!(m.revenue_growth_pct, None);
        assert!(m.comparison.is_none());
    }

    #[test]
    fn zero_comparison_base_is_undefined() {
        let fact = SalesFactTable::new(vec![row("a", 2023, 6, 10.0, 0.0)]);
        let m = calculate(&fact, 2023, Some(2019));

        let base = m.comparison.as_ref().unwrap();
        assert_eq!(base.revenue, 0.0);
        assert_eq!(base.avg_order_value, None);
        assert_eq!(m.absolute_growth, Some(10.0));
        assert_eq!(m.revenue_growth_pct, None);
        assert_eq!(m.orders_growth_pct, None);
        assert_eq!(m.aov_growth_pct, None);
    }

    #[test]
    fn empty_table() {
        let m = calculate(&SalesFactTable::default(), 2023, Some(2022));
        assert_eq!(m.primary.revenue, 0.0);
        assert_eq!(m.primary.order_count, 0);
        assert_eq!(m.primary.avg_order_value, None);
        assert_eq!(m.monthly_revenue, [0.0; 12]);
    }
}

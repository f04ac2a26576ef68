use serde::Serialize;

use super::{group_rows, ranked};
use crate::sales::SalesFactTable;
use crate::stats::{concentration_index, ratio};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryPerformance {
    pub category: String,
    /// 1-based, by revenue descending then category name
    pub rank: usize,
    pub revenue: f64,
    pub order_count: usize,
    pub item_count: usize,
    pub avg_item_price: f64,
    /// Fraction of total revenue; 0 when the total is 0
    pub revenue_share: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryMetrics {
    pub total_revenue: f64,
    pub categories: Vec<CategoryPerformance>,
    /// Sum of squared revenue shares
    pub concentration_index: Option<f64>,
}

pub fn calculate(fact: &SalesFactTable) -> CategoryMetrics {
    let groups = ranked(group_rows(fact.rows(), |r| r.category.as_str()));
    let total_revenue: f64 = groups.iter().map(|(_, g)| g.revenue).sum();
    let revenues: Vec<f64> = groups.iter().map(|(_, g)| g.revenue).collect();

    let categories = groups
        .into_iter()
        .enumerate()
        .map(|(i, (category, g))| CategoryPerformance {
            category: category.to_string(),
            rank: i + 1,
            revenue: g.revenue,
            order_count: g.orders.len(),
            item_count: g.items,
            avg_item_price: g.price_total / g.items as f64,
            revenue_share: ratio(g.revenue, total_revenue).unwrap_or(0.0),
        })
        .collect();

    CategoryMetrics {
        total_revenue,
        categories,
        concentration_index: concentration_index(&revenues),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::sales::SalesFact;

    fn row(order_id: &str, category: &str, price: f64) -> SalesFact {
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
            freight_value: 0.0,
            category: category.into(),
            customer_state: "SP".into(),
            customer_city: "x".into(),
            year: Some(2023),
            month: Some(1),
            quarter: Some(1),
        }
    }

    #[test]
    fn sorted_by_revenue_with_name_tiebreak() {
        let fact = SalesFactTable::new(vec![
            row("a", "toys", 30.0),
            row("b", "books", 30.0),
            row("c", "garden", 60.0),
            row("c", "books", 0.0),
        ]);

        let m = calculate(&fact);
        let names: Vec<&str> = m.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["garden", "books", "toys"]);
        assert_eq!(m.categories[1].rank, 2);
        assert_eq!(m.categories[1].order_count, 2);
        assert_eq!(m.categories[1].item_count, 2);
        assert_eq!(m.categories[1].avg_item_price, 15.0);
        assert_eq!(m.categories[0].revenue_share, 0.5);

        let share_sum: f64 = m.categories.iter().map(|c| c.revenue_share).sum();
        assert!((share_sum - 1.0).abs() < 1e-12);
        // 0.5^2 + 0.25^2 + 0.25^2
        assert!((m.concentration_index.unwrap() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn single_category_is_fully_concentrated() {
        let fact = SalesFactTable::new(vec![row("a", "toys", 10.0), row("b", "toys", 5.0)]);
        assert_eq!(calculate(&fact).concentration_index, Some(1.0));
    }

    #[test]
    fn empty_table() {
        let m = calculate(&SalesFactTable::default());
        assert!(m.categories.is_empty());
        assert_eq!(m.total_revenue, 0.0);
        assert_eq!(m.concentration_index, None);
    }
}

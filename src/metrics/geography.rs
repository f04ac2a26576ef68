use serde::Serialize;

use super::{group_rows, ranked};
use crate::sales::SalesFactTable;
use crate::stats::{concentration_index, ratio};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatePerformance {
    pub state: String,
    pub rank: usize,
    pub revenue: f64,
    pub order_count: usize,
    pub customer_count: usize,
    pub item_count: usize,
    pub avg_order_value: Option<f64>,
    pub revenue_share: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeographicMetrics {
    pub total_revenue: f64,
    /// Every state, ranked by revenue
    pub states: Vec<StatePerformance>,
    /// The first N of `states`
    pub top_states: Vec<StatePerformance>,
    pub concentration_index: Option<f64>,
}

pub fn calculate(fact: &SalesFactTable, top_n: Option<usize>) -> GeographicMetrics {
    let groups = ranked(group_rows(fact.rows(), |r| r.customer_state.as_str()));
    let total_revenue: f64 = groups.iter().map(|(_, g)| g.revenue).sum();
    let revenues: Vec<f64> = groups.iter().map(|(_, g)| g.revenue).collect();

    let states: Vec<StatePerformance> = groups
        .into_iter()
        .enumerate()
        .map(|(i, (state, g))| StatePerformance {
            state: state.to_string(),
            rank: i + 1,
            revenue: g.revenue,
            order_count: g.orders.len(),
            customer_count: g.customers.len(),
            item_count: g.items,
            avg_order_value: ratio(g.revenue, g.orders.len() as f64),
            revenue_share: ratio(g.revenue, total_revenue).unwrap_or(0.0),
        })
        .collect();

    let n = top_n.unwrap_or(states.len()).min(states.len());
    let top_states = states[..n].to_vec();

    GeographicMetrics {
        total_revenue,
        states,
        top_states,
        concentration_index: concentration_index(&revenues),
    }
}

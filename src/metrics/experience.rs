use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::delivery::{DeliveryRecord, DeliveryRecords, DeliverySpeed};
use crate::sales::SalesFactTable;
use crate::stats::{mean, median, pearson, ratio};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExperienceMetrics {
    /// Distinct orders in the fact table
    pub order_count: usize,
    /// Orders with a delivery duration sample
    pub delivered_orders: usize,
    /// Orders without a duration sample
    pub excluded_orders: usize,
    pub mean_delivery_days: Option<f64>,
    pub median_delivery_days: Option<f64>,
    /// On-time orders over orders with a defined on-time flag
    pub on_time_rate: Option<f64>,
    pub reviewed_orders: usize,
    pub mean_review_score: Option<f64>,
    /// Orders per score, keys 1 through 5 always present
    pub review_score_distribution: BTreeMap<u8, usize>,
    /// Pearson correlation of delivery days and review score
    pub delivery_review_correlation: Option<f64>,
    pub delivery_speed_distribution: BTreeMap<DeliverySpeed, usize>,
    pub mean_review_by_delivery_speed: BTreeMap<DeliverySpeed, f64>,
}

pub fn calculate(fact: &SalesFactTable, deliveries: &DeliveryRecords) -> ExperienceMetrics {
    let in_scope: HashSet<&str> = fact.rows().iter().map(|r| r.order_id.as_str()).collect();
    let records: Vec<&DeliveryRecord> = deliveries
        .records()
        .iter()
        .filter(|r| in_scope.contains(r.order_id.as_str()))
        .collect();

    let days: Vec<f64> = records
        .iter()
        .filter_map(|r| r.delivery_days)
        .map(|d| d as f64)
        .collect();

    let flagged: Vec<bool> = records.iter().filter_map(|r| r.on_time).collect();
    let on_time = flagged.iter().filter(|&&f| f).count();

    let scores: Vec<f64> = records
        .iter()
        .filter_map(|r| r.score)
        .map(f64::from)
        .collect();

    let mut review_score_distribution: BTreeMap<u8, usize> = (1..=5).map(|s| (s, 0)).collect();
    for score in records.iter().filter_map(|r| r.score) {
        *review_score_distribution.entry(score).or_default() += 1;
    }

    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| match (r.delivery_days, r.score) {
            (Some(d), Some(s)) => Some((d as f64, f64::from(s))),
            _ => None,
        })
        .collect();

    let mut delivery_speed_distribution: BTreeMap<DeliverySpeed, usize> = BTreeMap::new();
    let mut scores_by_speed: BTreeMap<DeliverySpeed, Vec<f64>> = BTreeMap::new();
    for record in &records {
        if let Some(speed) = record.speed {
            *delivery_speed_distribution.entry(speed).or_default() += 1;
            if let Some(score) = record.score {
                scores_by_speed.entry(speed).or_default().push(f64::from(score));
            }
        }
    }
    let mean_review_by_delivery_speed = scores_by_speed
        .into_iter()
        .filter_map(|(speed, s)| mean(&s).map(|m| (speed, m)))
        .collect();

    ExperienceMetrics {
        order_count: records.len(),
        delivered_orders: days.len(),
        excluded_orders: records.len() - days.len(),
        mean_delivery_days: mean(&days),
        median_delivery_days: median(&days),
        on_time_rate: ratio(on_time as f64, flagged.len() as f64),
        reviewed_orders: scores.len(),
        mean_review_score: mean(&scores),
        review_score_distribution,
        delivery_review_correlation: pearson(&pairs),
        delivery_speed_distribution,
        mean_review_by_delivery_speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::augment;
    use crate::models::{OrderStatus, Review};
    use crate::sales::SalesFact;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn row(order_id: &str, delivered_day: Option<u32>, estimated_day: Option<u32>) -> SalesFact {
        SalesFact {
            order_id: order_id.into(),
            item_seq: 1,
            product_id: "p".into(),
            customer_id: "c".into(),
            status: OrderStatus::Delivered,
            purchased_at: Some(day(1)),
            delivered_at: delivered_day.map(day),
            estimated_delivery_at: estimated_day.map(day),
            price: 1.0,
            freight_value: 0.0,
            category: "x".into(),
            customer_state: "SP".into(),
            customer_city: "x".into(),
            year: Some(2023),
            month: Some(3),
            quarter: Some(1),
        }
    }

    fn review(order_id: &str, score: u8) -> Review {
        Review {
            order_id: order_id.into(),
            score: Some(score),
            reviewed_at: None,
        }
    }

    #[test]
    fn delivery_and_satisfaction() {
        let fact = SalesFactTable::new(vec![
            row("a", Some(3), Some(5)),
            row("b", Some(6), Some(5)),
            row("c", Some(12), None),
            row("d", None, Some(5)),
        ]);
        let reviews = vec![review("a", 5), review("b", 4), review("c", 1), review("d", 3)];
        let m = calculate(&fact, &augment(&fact, &reviews));

        assert_eq!(m.order_count, 4);
        assert_eq!(m.delivered_orders, 3);
        assert_eq!(m.excluded_orders, 1);
        assert_eq!(m.mean_delivery_days, Some(6.0));
        assert_eq!(m.median_delivery_days, Some(5.0));
        assert_eq!(m.on_time_rate, Some(0.5));
        assert_eq!(m.reviewed_orders, 4);
        assert_eq!(m.mean_review_score, Some(3.25));
        assert_eq!(m.review_score_distribution.len(), 5);
        assert_eq!(m.review_score_distribution[&2], 0);
        assert_eq!(m.review_score_distribution[&5], 1);

        let r = m.delivery_review_correlation.unwrap();
        assert!(r < 0.0 && r >= -1.0);

        assert_eq!(m.delivery_speed_distribution[&DeliverySpeed::UpToThreeDays], 1);
        assert_eq!(m.mean_review_by_delivery_speed[&DeliverySpeed::EightPlusDays], 1.0);
    }

    #[test]
    fn correlation_needs_two_pairs() {
        let fact = SalesFactTable::new(vec![row("a", Some(3), None), row("b", None, None)]);
        let reviews = vec![review("a", 5), review("b", 1)];
        let m = calculate(&fact, &augment(&fact, &reviews));
        assert_eq!(m.delivery_review_correlation, None);
        assert_eq!(m.on_time_rate, None);
    }

    #[test]
    fn records_outside_the_fact_are_ignored() {
        let all = SalesFactTable::new(vec![row("a", Some(3), Some(5)), row("b", Some(9), Some(5))]);
        let deliveries = augment(&all, &[]);
        let only_a = all.retain(|r| r.order_id == "a");

        let m = calculate(&only_a, &deliveries);
        assert_eq!(m.order_count, 1);
        assert_eq!(m.on_time_rate, Some(1.0));
    }

    #[test]
    fn empty_table() {
        let m = calculate(&SalesFactTable::default(), &DeliveryRecords::default());
        assert_eq!(m.order_count, 0);
        assert_eq!(m.mean_delivery_days, None);
        assert_eq!(m.median_delivery_days, None);
        assert_eq!(m.mean_review_score, None);
        assert_eq!(m.delivery_review_correlation, None);
        assert!(m.review_score_distribution.values().all(|&c| c == 0));
    }
}

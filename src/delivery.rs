//! Per-order delivery outcomes and satisfaction

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::models::Review;
use crate::sales::SalesFactTable;

/// Delivery speed bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliverySpeed {
    #[serde(rename = "1-3 days")]
    UpToThreeDays,
    #[serde(rename = "4-7 days")]
    FourToSevenDays,
    #[serde(rename = "8+ days")]
    EightPlusDays,
}

impl DeliverySpeed {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 3 => DeliverySpeed::UpToThreeDays,
            d if d <= 7 => DeliverySpeed::FourToSevenDays,
            _ => DeliverySpeed::EightPlusDays,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliverySpeed::UpToThreeDays => "1-3 days",
            DeliverySpeed::FourToSevenDays => "4-7 days",
            DeliverySpeed::EightPlusDays => "8+ days",
        }
    }
}

impl fmt::Display for DeliverySpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryRecord {
    pub order_id: String,
    /// Whole days from purchase to delivery, truncated
    pub delivery_days: Option<i64>,
    /// Delivered no later than estimated; `None` without both dates
    pub on_time: Option<bool>,
    pub speed: Option<DeliverySpeed>,
    /// Score of the order's primary review
    pub score: Option<u8>,
}

/// One record per distinct order of a fact table
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DeliveryRecords {
    records: Vec<DeliveryRecord>,
}

impl DeliveryRecords {
    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Orders without a duration sample (missing purchase or delivery timestamp)
    pub fn excluded_orders(&self) -> usize {
        self.records.iter().filter(|r| r.delivery_days.is_none()).count()
    }

    pub fn delivered(&self) -> impl Iterator<Item = &DeliveryRecord> {
        self.records.iter().filter(|r| r.delivery_days.is_some())
    }
}

/// Compute delivery outcomes for every order in `fact`, attaching the first
/// review (in input order) of each order.
pub fn augment(fact: &SalesFactTable, reviews: &[Review]) -> DeliveryRecords {
    let mut primary_scores: HashMap<&str, Option<u8>> = HashMap::new();
    for review in reviews {
        primary_scores
            .entry(review.order_id.as_str())
            .or_insert(review.score);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut records = Vec::new();

    for row in fact.rows() {
        if !seen.insert(row.order_id.as_str()) {
            continue;
        }

        let delivery_days = match (row.purchased_at, row.delivered_at) {
            (Some(purchased), Some(delivered)) => Some((delivered - purchased).num_days()),
            _ => None,
        };
        let on_time = match (delivery_days, row.delivered_at, row.estimated_delivery_at) {
            (Some(_), Some(delivered), Some(estimated)) => Some(delivered <= estimated),
            _ => None,
        };

        records.push(DeliveryRecord {
            order_id: row.order_id.clone(),
            delivery_days,
            on_time,
            speed: delivery_days.map(DeliverySpeed::from_days),
            score: primary_scores.get(row.order_id.as_str()).copied().flatten(),
        });
    }

    let out = DeliveryRecords { records };
    debug!(
        "Delivery records for {} orders, {} without a duration sample",
        out.len(),
        out.excluded_orders()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::sales::SalesFact;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn row(
        order_id: &str,
        purchased: Option<NaiveDateTime>,
        delivered: Option<NaiveDateTime>,
        estimated: Option<NaiveDateTime>,
    ) -> SalesFact {
        SalesFact {
            order_id: order_id.into(),
            item_seq: 1,
            product_id: "p".into(),
            customer_id: "c".into(),
            status: OrderStatus::Delivered,
            purchased_at: purchased,
            delivered_at: delivered,
            estimated_delivery_at: estimated,
            price: 1.0,
            freight_value: 0.0,
            category: "x".into(),
            customer_state: "SP".into(),
            customer_city: "x".into(),
            year: purchased.map(|_| 2023),
            month: purchased.map(|_| 1),
            quarter: purchased.map(|_| 1),
        }
    }

    fn review(order_id: &str, score: Option<u8>) -> Review {
        Review {
            order_id: order_id.into(),
            score,
            reviewed_at: None,
        }
    }

    #[test]
    fn duration_is_truncated_to_whole_days() {
        let fact = SalesFactTable::new(vec![row(
            "o1",
            Some(at(1, 5, 18)),
            Some(at(1, 10, 9)),
            Some(at(1, 12, 0)),
        )]);
        let out = augment(&fact, &[]);
        let rec = &out.records()[0];
        assert_eq!(rec.delivery_days, Some(4));
        assert_eq!(rec.on_time, Some(true));
        assert_eq!(rec.speed, Some(DeliverySpeed::FourToSevenDays));
    }

    #[test]
    fn on_time_compares_full_timestamps() {
        let fact = SalesFactTable::new(vec![
            row("midnight", Some(at(1, 2, 0)), Some(at(1, 12, 0)), Some(at(1, 12, 0))),
            row("afternoon", Some(at(1, 2, 0)), Some(at(1, 12, 15)), Some(at(1, 12, 0))),
        ]);
        let out = augment(&fact, &[]);
        assert_eq!(out.records()[0].on_time, Some(true));
        assert_eq!(out.records()[1].on_time, Some(false));
    }

    #[test]
    fn one_record_per_order_with_primary_review() {
        let fact = SalesFactTable::new(vec![
            row("o1", Some(at(1, 1, 0)), Some(at(1, 3, 0)), None),
            row("o1", Some(at(1, 1, 0)), Some(at(1, 3, 0)), None),
        ]);
        let out = augment(&fact, &[review("o1", Some(2)), review("o1", Some(5))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].score, Some(2));
        assert_eq!(out.records()[0].on_time, None);
    }

    #[test]
    fn missing_timestamps_are_excluded_not_errors() {
        let fact = SalesFactTable::new(vec![
            row("o1", Some(at(2, 1, 0)), None, Some(at(2, 9, 0))),
            row("o2", None, Some(at(2, 9, 0)), None),
            row("o3", Some(at(2, 1, 0)), Some(at(2, 20, 0)), Some(at(2, 9, 0))),
        ]);
        let out = augment(&fact, &[review("o1", Some(4))]);
        assert_eq!(out.excluded_orders(), 2);
        assert_eq!(out.delivered().count(), 1);
        assert_eq!(out.records()[0].score, Some(4));
        assert_eq!(out.records()[2].on_time, Some(false));
        assert_eq!(out.records()[2].speed, Some(DeliverySpeed::EightPlusDays));
    }
}

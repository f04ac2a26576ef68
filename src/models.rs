use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used by every source table
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a source timestamp. Date-only values are taken as midnight.
pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(ts);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("unparseable timestamp '{}'", s))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn parse_optional_timestamp(s: &Option<String>) -> anyhow::Result<Option<NaiveDateTime>> {
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_timestamp(v).map(Some),
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Approved,
    Invoiced,
    Processing,
    Shipped,
    Delivered,
    Canceled,
    Unavailable,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Created,
        OrderStatus::Approved,
        OrderStatus::Invoiced,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
        OrderStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Unavailable => "unavailable",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the known set
    /// Case-insensitive exact match on the status name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            Some(status) => Ok(status),
            None => bail!("unknown order status '{}'", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchased_at: Option<NaiveDateTime>,
    pub approved_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
    pub estimated_delivery_at: Option<NaiveDateTime>,
}

/// One line of an order; `(order_id, item_seq)` is unique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub order_id: String,
    pub item_seq: u32,
    pub product_id: String,
    pub price: f64,
    pub freight_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub customer_id: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub order_id: String,
    /// Satisfaction score in 1..=5
    pub score: Option<u8>,
    pub reviewed_at: Option<NaiveDateTime>,
}

// ============================================================================
// Raw CSV rows (column names follow the public dataset headers)
// ============================================================================

/// Raw record from `orders_dataset.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCsvRecord {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: Option<String>,
    pub order_approved_at: Option<String>,
    pub order_delivered_customer_date: Option<String>,
    pub order_estimated_delivery_date: Option<String>,
}

/// Raw record from `order_items_dataset.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCsvRecord {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub price: f64,
    pub freight_value: f64,
}

/// Raw record from `products_dataset.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCsvRecord {
    pub product_id: String,
    pub product_category_name: Option<String>,
}

/// Raw record from `customers_dataset.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCsvRecord {
    pub customer_id: String,
    pub customer_city: String,
    pub customer_state: String,
}

/// Raw record from `order_reviews_dataset.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCsvRecord {
    pub order_id: String,
    pub review_score: Option<u8>,
    pub review_creation_date: Option<String>,
}

impl OrderCsvRecord {
    pub fn to_order(&self) -> anyhow::Result<Order> {
        let order = Order {
            order_id: self.order_id.clone(),
            customer_id: self.customer_id.clone(),
            status: self.order_status.parse()?,
            purchased_at: parse_optional_timestamp(&self.order_purchase_timestamp)?,
            approved_at: parse_optional_timestamp(&self.order_approved_at)?,
            delivered_at: parse_optional_timestamp(&self.order_delivered_customer_date)?,
            estimated_delivery_at: parse_optional_timestamp(&self.order_estimated_delivery_date)?,
        };

        if let (Some(purchased), Some(delivered)) = (order.purchased_at, order.delivered_at) {
            if delivered < purchased {
                bail!("order {} delivered before it was purchased", order.order_id);
            }
        }

        Ok(order)
    }
}

impl OrderItemCsvRecord {
    pub fn to_order_item(&self) -> anyhow::Result<OrderItem> {
        if !self.price.is_finite() || !self.freight_value.is_finite() {
            bail!("non-finite amount on item {}#{}", self.order_id, self.order_item_id);
        }
        Ok(OrderItem {
            order_id: self.order_id.clone(),
            item_seq: self.order_item_id,
            product_id: self.product_id.clone(),
            price: self.price,
            freight_value: self.freight_value,
        })
    }
}

impl ProductCsvRecord {
    pub fn to_product(&self) -> Product {
        let category = self
            .product_category_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Product {
            product_id: self.product_id.clone(),
            category,
        }
    }
}

impl CustomerCsvRecord {
    pub fn to_customer(&self) -> Customer {
        Customer {
            customer_id: self.customer_id.clone(),
            state: self.customer_state.trim().to_uppercase(),
            city: self.customer_city.trim().to_string(),
        }
    }
}

impl ReviewCsvRecord {
    pub fn to_review(&self) -> anyhow::Result<Review> {
        if let Some(score) = self.review_score {
            if !(1..=5).contains(&score) {
                bail!("review score {} for order {} is outside 1-5", score, self.order_id);
            }
        }
        Ok(Review {
            order_id: self.order_id.clone(),
            score: self.review_score,
            reviewed_at: parse_optional_timestamp(&self.review_creation_date)?,
        })
    }
}

//! Year, month-range and status filtering of the fact table

use crate::config::MonthRange;
use crate::error::Result;
use crate::models::OrderStatus;
use crate::sales::SalesFactTable;

/// Status predicate after parsing. An unrecognised status matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusMatch {
    Any,
    Only(OrderStatus),
    Nothing,
}

impl StatusMatch {
    fn from_filter(status: Option<&str>) -> Self {
        match status {
            None => StatusMatch::Any,
            Some(s) => OrderStatus::parse(s).map_or(StatusMatch::Nothing, StatusMatch::Only),
        }
    }

    fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusMatch::Any => true,
            StatusMatch::Only(wanted) => *wanted == status,
            StatusMatch::Nothing => false,
        }
    }
}

/// A validated date-range and status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeFilter {
    year: i32,
    months: Option<MonthRange>,
    status: StatusMatch,
}

impl DateRangeFilter {
    pub fn new(year: i32, months: Option<MonthRange>, status: Option<&str>) -> Self {
        Self {
            year,
            months,
            status: StatusMatch::from_filter(status),
        }
    }

    /// Same month range and status, different year
    pub fn with_year(&self, year: i32) -> Self {
        Self { year, ..*self }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Rows without a purchase timestamp never pass.
    pub fn apply(&self, fact: &SalesFactTable) -> SalesFactTable {
        fact.retain(|row| {
            let in_period = match (row.year, row.month) {
                (Some(year), Some(month)) => {
                    year == self.year && self.months.map_or(true, |m| m.contains(month))
                }
                _ => false,
            };
            in_period && self.status.matches(row.status)
        })
    }
}

/// Filter `fact` to `year`, an optional inclusive month range and an optional status.
///
/// Month bounds are validated before any row is examined: both or neither must
/// be given, each within 1-12, with `start_month <= end_month`.
pub fn filter(
    fact: &SalesFactTable,
    year: i32,
    start_month: Option<u32>,
    end_month: Option<u32>,
    status: Option<&str>,
) -> Result<SalesFactTable> {
    let months = MonthRange::from_bounds(start_month, end_month)?;
    Ok(DateRangeFilter::new(year, months, status).apply(fact))
}

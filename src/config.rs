//! Analysis parameters, validated once at construction

use serde::Serialize;

use crate::error::{MetricsError, Result};

/// Inclusive calendar-month bounds inside one year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    start: u32,
    end: u32,
}

impl MonthRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        for month in [start, end] {
            if !(1..=12).contains(&month) {
                return Err(MetricsError::InvalidRange(format!(
                    "month {} is outside 1-12",
                    month
                )));
            }
        }
        if start > end {
            return Err(MetricsError::InvalidRange(format!(
                "start month {} is after end month {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Both bounds or neither; a single bound is rejected rather than read as open-ended.
    pub fn from_bounds(start: Option<u32>, end: Option<u32>) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            (Some(_), None) => Err(MetricsError::InvalidRange(
                "start month given without an end month".to_string(),
            )),
            (None, Some(_)) => Err(MetricsError::InvalidRange(
                "end month given without a start month".to_string(),
            )),
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, month: u32) -> bool {
        (self.start..=self.end).contains(&month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisConfig {
    analysis_year: i32,
    comparison_year: Option<i32>,
    months: Option<MonthRange>,
    order_status_filter: Option<String>,
    top_n_states: Option<usize>,
}

impl AnalysisConfig {
    pub fn new(
        analysis_year: i32,
        comparison_year: Option<i32>,
        start_month: Option<u32>,
        end_month: Option<u32>,
        order_status_filter: Option<String>,
        top_n_states: Option<usize>,
    ) -> Result<Self> {
        let months = MonthRange::from_bounds(start_month, end_month)?;
        if top_n_states == Some(0) {
            return Err(MetricsError::InvalidConfig(
                "top_n_states must be at least 1".to_string(),
            ));
        }
        let order_status_filter = order_status_filter.filter(|s| !s.is_empty());

        Ok(Self {
            analysis_year,
            comparison_year,
            months,
            order_status_filter,
            top_n_states,
        })
    }

    /// Whole-year analysis over every status
    pub fn for_year(analysis_year: i32) -> Self {
        Self {
            analysis_year,
            comparison_year: None,
            months: None,
            order_status_filter: None,
            top_n_states: None,
        }
    }

    pub fn analysis_year(&self) -> i32 {
        self.analysis_year
    }

    pub fn comparison_year(&self) -> Option<i32> {
        self.comparison_year
    }

    pub fn months(&self) -> Option<MonthRange> {
        self.months
    }

    pub fn order_status_filter(&self) -> Option<&str> {
        self.order_status_filter.as_deref()
    }

    pub fn top_n_states(&self) -> Option<usize> {
        self.top_n_states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_are_validated() {
        assert!(MonthRange::new(3, 3).is_ok());
        assert!(matches!(MonthRange::new(0, 3), Err(MetricsError::InvalidRange(_))));
        assert!(matches!(MonthRange::new(4, 13), Err(MetricsError::InvalidRange(_))));
        assert!(matches!(MonthRange::new(9, 2), Err(MetricsError::InvalidRange(_))));
    }

    #[test]
    fn partial_bounds_are_rejected() {
        assert!(MonthRange::from_bounds(Some(2), None).is_err());
        assert!(MonthRange::from_bounds(None, Some(2)).is_err());
        assert_eq!(MonthRange::from_bounds(None, None).unwrap(), None);
    }

    #[test]
    fn config_validates_at_construction() {
        let config =
            AnalysisConfig::new(2023, Some(2022), Some(1), Some(6), Some("delivered".into()), None)
                .unwrap();
        assert_eq!(config.order_status_filter(), Some("delivered"));
        let padded =
            AnalysisConfig::new(2023, None, None, None, Some(" delivered ".into()), None).unwrap();
        assert_eq!(padded.order_status_filter(), Some(" delivered "));
        assert_eq!(config.months().map(|m| (m.start(), m.end())), Some((1, 6)));

        assert!(matches!(
            AnalysisConfig::new(2023, None, None, None, None, Some(0)),
            Err(MetricsError::InvalidConfig(_))
        ));
        assert!(AnalysisConfig::new(2023, None, Some(5), None, None, None).is_err());
    }
}

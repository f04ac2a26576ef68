//! End-to-end analysis run: join, filter, augment, measure

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::delivery;
use crate::error::Result;
use crate::filter::DateRangeFilter;
use crate::metrics::{
    order_status_distribution, CategoryMetrics, ExperienceMetrics, GeographicMetrics,
    MetricsCalculator, RevenueMetrics,
};
use crate::models::OrderStatus;
use crate::registry::DatasetRegistry;
use crate::sales::{validate_reviews, SalesFactBuilder, SalesFactTable};

/// Everything one run produces, ready for printing or serialization
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub fact_rows: usize,
    /// Fact rows dropped from time-based metrics for lack of a purchase timestamp
    pub undated_rows: usize,
    /// Fact rows left after the year, month and status filter
    pub filtered_rows: usize,
    pub revenue: RevenueMetrics,
    pub categories: CategoryMetrics,
    pub geography: GeographicMetrics,
    pub experience: ExperienceMetrics,
    /// Percent of orders per status in the analysis year, before the status filter
    pub status_distribution: BTreeMap<OrderStatus, f64>,
}

impl AnalysisReport {
    pub fn has_data(&self) -> bool {
        self.filtered_rows > 0
    }
}

pub fn run_analysis(registry: &DatasetRegistry, config: &AnalysisConfig) -> Result<AnalysisReport> {
    validate_reviews(registry)?;
    let fact = SalesFactBuilder::from_registry(registry).build()?;

    let filter = DateRangeFilter::new(
        config.analysis_year(),
        config.months(),
        config.order_status_filter(),
    );
    let primary = filter.apply(&fact);
    info!(
        "{} of {} fact rows match year {}",
        primary.len(),
        fact.len(),
        config.analysis_year()
    );

    let revenue_scope = match config.comparison_year() {
        Some(year) if year != config.analysis_year() => {
            let comparison = filter.with_year(year).apply(&fact);
            info!("{} fact rows match comparison year {}", comparison.len(), year);
            let mut rows = primary.rows().to_vec();
            rows.extend_from_slice(comparison.rows());
            SalesFactTable::new(rows)
        }
        _ => primary.clone(),
    };

    let deliveries = delivery::augment(&primary, registry.reviews());
    let calculator = MetricsCalculator::new(&primary);

    Ok(AnalysisReport {
        config: config.clone(),
        fact_rows: fact.len(),
        undated_rows: fact.undated_rows(),
        filtered_rows: primary.len(),
        revenue: MetricsCalculator::new(&revenue_scope)
            .calculate_revenue_metrics(config.analysis_year(), config.comparison_year()),
        categories: calculator.calculate_category_metrics(),
        geography: calculator.calculate_geographic_metrics(config.top_n_states()),
        experience: calculator.calculate_customer_experience_metrics(&deliveries),
        status_distribution: order_status_distribution(registry.orders(), Some(config.analysis_year())),
    })
}

use thiserror::Error;

/// Errors raised by the metrics pipeline.
///
/// Statistical degeneracies (zero growth base, too few samples) are never
/// errors; they surface as `None` in the metric records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("{source_table} references unknown order '{order_id}'")]
    MissingOrderReference {
        source_table: &'static str,
        order_id: String,
    },

    #[error("Invalid month range: {0}")]
    InvalidRange(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

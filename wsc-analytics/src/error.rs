use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Too few measurements to compare
    #[error("Insufficient data points (needed: {needed}, found: {found})")]
    InsufficientData { needed: usize, found: usize },

    /// Reference area is zero, so a percentage change is undefined
    #[error("Reference area is zero for {0}; percentage change is undefined")]
    ZeroBaseline(String),

    #[error("Trend period must be at least one month")]
    InvalidPeriod,
}

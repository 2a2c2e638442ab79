//! Analytics over waterbody surface area time series.
//!
//! Every function here is pure: inputs are copied and ordered by timestamp
//! before use, and nothing is persisted.

pub mod comparison;
pub mod drought;
pub mod error;
pub mod series;
pub mod timeseries;
pub mod trend;

pub use comparison::{compare_latest, Comparison, ComparisonEntry};
pub use drought::{assess_drought, rank_by_risk, DroughtAssessment, DroughtTrend, RiskLevel};
pub use error::AnalyticsError;
pub use timeseries::{build_timeseries, DataPoint, Timeseries};
pub use trend::{assess_trend, TrendAssessment, TrendDirection};

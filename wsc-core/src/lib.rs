pub mod error;
pub mod geometry;
pub mod measurement;
pub mod repository;
pub mod waterbody;

pub use error::{ConfigError, MeasurementError};
pub use geometry::{BoundingBox, Geometry, Position};
pub use measurement::Measurement;
pub use repository::{AreaStatistics, MeasurementRepository};
pub use waterbody::WaterbodyConfig;

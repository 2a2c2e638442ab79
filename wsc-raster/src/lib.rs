//! Turns Process API water-mask payloads into surface area measurements.

pub mod area;
pub mod decode;
pub mod error;
pub mod payload;

pub use area::{bbox_area_km2, estimate, try_estimate, AreaEstimate, Estimate};
pub use decode::{count_water_pixels, RasterResult};
pub use error::{RasterError, Result};

use crate::{
    decode::{count_water_pixels, RasterResult},
    error::{RasterError, Result},
    payload::extract_tiff,
};
use log::{debug, warn};
use serde::Serialize;
use wsc_core::{BoundingBox, Geometry};
use wsc_utils::numeric::round_to;

/// Kilometres per degree of latitude, also the equatorial length of a
/// degree of longitude.
pub const KM_PER_DEG_LAT: f64 = 111.32;

const HECTARES_PER_KM2: f64 = 100.0;

/// Area of a lon/lat bounding box in km², scaling longitude by the cosine of
/// `mean_latitude` (degrees).
pub fn bbox_area_km2(bbox: &BoundingBox, mean_latitude: f64) -> f64 {
    let km_per_deg_lon = KM_PER_DEG_LAT * mean_latitude.to_radians().cos();
    (bbox.lon_span() * km_per_deg_lon) * (bbox.lat_span() * KM_PER_DEG_LAT)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaEstimate {
    pub surface_area_hectares: f64,
    pub water_pixel_count: u64,
    pub total_pixel_count: u64,
    pub water_fraction: f64,
}

impl AreaEstimate {
    pub fn zero() -> Self {
        AreaEstimate {
            surface_area_hectares: 0.0,
            water_pixel_count: 0,
            total_pixel_count: 0,
            water_fraction: 0.0,
        }
    }

    pub fn from_raster(raster: RasterResult, bbox_km2: f64) -> Self {
        let fraction = raster.water_fraction();
        let hectares = (bbox_km2 * fraction * HECTARES_PER_KM2).max(0.0);
        AreaEstimate {
            surface_area_hectares: round_to(hectares, 2),
            water_pixel_count: raster.water_pixel_count,
            total_pixel_count: raster.total_pixel_count,
            water_fraction: round_to(fraction, 4),
        }
    }
}

/// Outcome of processing one payload.
///
/// A degraded estimate carries a zero area and the reason processing failed,
/// so callers can tell it apart from a genuinely dry waterbody.
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate {
    Measured(AreaEstimate),
    Degraded { estimate: AreaEstimate, error: String },
}

impl Estimate {
    pub fn area(&self) -> &AreaEstimate {
        match self {
            Estimate::Measured(estimate) | Estimate::Degraded { estimate, .. } => estimate,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Estimate::Measured(_) => None,
            Estimate::Degraded { error, .. } => Some(error.as_str()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Estimate::Degraded { .. })
    }
}

/// Like [`estimate`] but surfaces the failure.
pub fn try_estimate(raster_bytes: &[u8], geometry: &Geometry) -> Result<AreaEstimate> {
    let bbox = geometry.bounding_box().ok_or(RasterError::EmptyGeometry)?;
    let mean_latitude = geometry
        .mean_vertex_latitude()
        .ok_or(RasterError::EmptyGeometry)?;
    let tiff = extract_tiff(raster_bytes)?;
    let raster = count_water_pixels(&tiff)?;
    let bbox_km2 = bbox_area_km2(&bbox, mean_latitude);
    debug!(
        "bbox {:.3} km², {}/{} water pixels",
        bbox_km2, raster.water_pixel_count, raster.total_pixel_count
    );
    Ok(AreaEstimate::from_raster(raster, bbox_km2))
}

/// Estimates the water surface of `geometry` from a mask payload. Never
/// fails: processing errors degrade to a zero-area estimate.
pub fn estimate(raster_bytes: &[u8], geometry: &Geometry) -> Estimate {
    match try_estimate(raster_bytes, geometry) {
        Ok(estimate) => Estimate::Measured(estimate),
        Err(err) => {
            warn!("Raster processing failed, reporting zero area: {}", err);
            Estimate::Degraded {
                estimate: AreaEstimate::zero(),
                error: err.to_string(),
            }
        }
    }
}

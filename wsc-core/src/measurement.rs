use crate::{error::MeasurementError, waterbody::WaterbodyConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SENTINEL_2: &str = "Sentinel-2";

fn default_data_source() -> String {
    SENTINEL_2.to_string()
}

/// One surface-area observation of a waterbody.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub waterbody_id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub surface_area_hectares: f64,
    #[serde(default = "default_data_source")]
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover_percentage: Option<f64>,
    /// Set when the raster could not be processed and the area fell back to zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl Measurement {
    pub fn new(waterbody: &WaterbodyConfig, timestamp: DateTime<Utc>, hectares: f64) -> Self {
        Measurement {
            waterbody_id: waterbody.id.clone(),
            name: waterbody.name.clone(),
            timestamp,
            surface_area_hectares: hectares,
            data_source: default_data_source(),
            cloud_cover_percentage: None,
            processing_error: None,
        }
    }

    pub fn with_processing_error(mut self, error: impl Into<String>) -> Self {
        self.processing_error = Some(error.into());
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.processing_error.is_some()
    }

    pub fn validate(&self) -> Result<(), MeasurementError> {
        if self.waterbody_id.is_empty() {
            return Err(MeasurementError::EmptyWaterbodyId);
        }
        let area = self.surface_area_hectares;
        if !area.is_finite() || area < 0.0 {
            return Err(MeasurementError::InvalidArea(area));
        }
        match self.cloud_cover_percentage {
            Some(cover) if !(0.0..=100.0).contains(&cover) => {
                Err(MeasurementError::InvalidCloudCover(cover))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use chrono::TimeZone;

    fn mead() -> WaterbodyConfig {
        WaterbodyConfig::new("lake_mead", "Lake Mead", Geometry::rectangle(-114.8, 36.0, -114.2, 36.5))
    }

    #[test]
    fn test_new_measurement_defaults() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let m = Measurement::new(&mead(), ts, 12_345.67);
        assert_eq!(m.data_source, "Sentinel-2");
        assert!(!m.is_degraded());
        assert!(m.validate().is_ok());

        let degraded = Measurement::new(&mead(), ts, 0.0).with_processing_error("bad tiff");
        assert!(degraded.is_degraded());
        assert!(degraded.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let negative = Measurement::new(&mead(), ts, -1.0);
        assert_eq!(negative.validate(), Err(MeasurementError::InvalidArea(-1.0)));
        assert!(Measurement::new(&mead(), ts, f64::NAN).validate().is_err());

        let mut cloudy = Measurement::new(&mead(), ts, 10.0);
        cloudy.cloud_cover_percentage = Some(140.0);
        assert_eq!(cloudy.validate(), Err(MeasurementError::InvalidCloudCover(140.0)));
    }

    #[test]
    fn test_serde_skips_empty_optionals() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(Measurement::new(&mead(), ts, 5.0)).unwrap();
        assert!(json.get("processing_error").is_none());
        assert_eq!(json["timestamp"], "2024-06-01T12:00:00Z");
    }
}

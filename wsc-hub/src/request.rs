use crate::{
    error::{HubError, Result},
    evalscript::water_mask_evalscript,
};
use serde::{Deserialize, Serialize};
use wsc_core::Geometry;
use wsc_utils::dates::{format_date, CalendarDay};

pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";
pub const SENTINEL_2_L2A: &str = "sentinel-2-l2a";
pub const TIFF_MIME: &str = "image/tiff";

/// Tunables for a water-mask request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Index threshold above which a pixel is water. Use 0.0 for turbid or
    /// winter scenes.
    pub ndwi_threshold: f64,
    pub max_cloud_coverage: u8,
    pub width: u32,
    pub height: u32,
    pub collection: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            ndwi_threshold: 0.2,
            max_cloud_coverage: 20,
            width: 512,
            height: 512,
            collection: SENTINEL_2_L2A.to_string(),
        }
    }
}

impl RequestOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.ndwi_threshold.is_finite() || !(-1.0..=1.0).contains(&self.ndwi_threshold) {
            return Err(HubError::InvalidOptions(format!(
                "ndwi threshold {} outside [-1, 1]",
                self.ndwi_threshold
            )));
        }
        if self.max_cloud_coverage > 100 {
            return Err(HubError::InvalidOptions(format!(
                "max cloud coverage {} exceeds 100",
                self.max_cloud_coverage
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(HubError::InvalidOptions(format!(
                "output size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.collection.is_empty() {
            return Err(HubError::InvalidOptions("collection is empty".to_string()));
        }
        Ok(())
    }
}

/// Body of a Process API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub input: Input,
    pub evalscript: String,
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub bounds: Bounds,
    pub data: Vec<DataSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub geometry: Geometry,
    pub properties: BoundsProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsProperties {
    pub crs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub collection: String,
    pub data_filter: DataFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilter {
    pub time_range: TimeRange,
    pub max_cloud_coverage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub width: u32,
    pub height: u32,
    pub responses: Vec<ResponseSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub identifier: String,
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub mime: String,
}

impl TimeRange {
    /// Whole calendar days from the start of `start` to the last second of `end`.
    pub fn whole_days<D: CalendarDay>(start: &D, end: &D) -> Result<Self> {
        let (start, end) = (start.calendar_day(), end.calendar_day());
        if end < start {
            return Err(HubError::InvalidTimeRange { start, end });
        }
        Ok(TimeRange {
            from: format!("{}T00:00:00Z", format_date(&start)),
            to: format!("{}T23:59:59Z", format_date(&end)),
        })
    }
}

/// Builds the water-mask request for `geometry` over the days `start..=end`.
///
/// The output is deterministic for equal inputs.
pub fn build_request<D: CalendarDay>(
    geometry: &Geometry,
    start: &D,
    end: &D,
    options: &RequestOptions,
) -> Result<ProcessRequest> {
    options.validate()?;
    let time_range = TimeRange::whole_days(start, end)?;
    Ok(ProcessRequest {
        input: Input {
            bounds: Bounds {
                geometry: geometry.clone(),
                properties: BoundsProperties {
                    crs: CRS84.to_string(),
                },
            },
            data: vec![DataSource {
                collection: options.collection.clone(),
                data_filter: DataFilter {
                    time_range,
                    max_cloud_coverage: options.max_cloud_coverage,
                },
            }],
        },
        evalscript: water_mask_evalscript(options.ndwi_threshold),
        output: Output {
            width: options.width,
            height: options.height,
            responses: vec![ResponseSpec {
                identifier: "default".to_string(),
                format: ResponseFormat {
                    mime: TIFF_MIME.to_string(),
                },
            }],
        },
    })
}

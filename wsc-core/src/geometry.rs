use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair in degrees.
pub type Position = [f64; 2];

/// GeoJSON-shaped geometry of a waterbody.
///
/// Only polygons are supported. The first ring is the outer boundary and is
/// the only one used for area scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    /// Polygon with a single outer ring.
    pub fn polygon(ring: Vec<Position>) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Axis-aligned rectangle, closed ring, counter-clockwise.
    pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Geometry::polygon(vec![
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat],
        ])
    }

    pub fn outer_ring(&self) -> &[Position] {
        match self {
            Geometry::Polygon { coordinates } => {
                coordinates.first().map(Vec::as_slice).unwrap_or(&[])
            }
        }
    }

    /// Checks every ring is closed, has at least four positions and holds
    /// finite in-range coordinates. Returns the reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        let Geometry::Polygon { coordinates } = self;
        if coordinates.is_empty() {
            return Err("polygon has no rings".to_string());
        }
        for (idx, ring) in coordinates.iter().enumerate() {
            if ring.len() < 4 {
                return Err(format!(
                    "ring {idx} has {} positions, at least 4 required",
                    ring.len()
                ));
            }
            if ring.first() != ring.last() {
                return Err(format!("ring {idx} is not closed"));
            }
            for [lon, lat] in ring {
                if !lon.is_finite() || !lat.is_finite() {
                    return Err(format!("ring {idx} contains a non-finite coordinate"));
                }
                if !(-180.0..=180.0).contains(lon) || !(-90.0..=90.0).contains(lat) {
                    return Err(format!("ring {idx} position ({lon}, {lat}) is out of range"));
                }
            }
        }
        Ok(())
    }

    /// Mean latitude of the outer ring's vertices, closing vertex included.
    /// Used for longitude scaling. `None` when the ring is empty.
    pub fn mean_vertex_latitude(&self) -> Option<f64> {
        let ring = self.outer_ring();
        if ring.is_empty() {
            return None;
        }
        Some(ring.iter().map(|[_, lat]| lat).sum::<f64>() / ring.len() as f64)
    }

    /// Bounding box of the outer ring, `None` when the ring is empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let ring = self.outer_ring();
        let [first_lon, first_lat] = *ring.first()?;
        let init = BoundingBox {
            min_lon: first_lon,
            min_lat: first_lat,
            max_lon: first_lon,
            max_lat: first_lat,
        };
        Some(ring.iter().fold(init, |bbox, &[lon, lat]| BoundingBox {
            min_lon: bbox.min_lon.min(lon),
            min_lat: bbox.min_lat.min(lat),
            max_lon: bbox.max_lon.max(lon),
            max_lat: bbox.max_lat.max(lat),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_round_shape() {
        let json = r#"{"type":"Polygon","coordinates":[[[10.0,45.0],[11.0,45.0],[11.0,46.0],[10.0,46.0],[10.0,45.0]]]}"#;
        let geometry: Geometry = serde_json::from_str(json).unwrap();
        assert_eq!(geometry, Geometry::rectangle(10.0, 45.0, 11.0, 46.0));
        let back = serde_json::to_value(&geometry).unwrap();
        assert_eq!(back["type"], "Polygon");
    }

    #[test]
    fn test_bounding_box() {
        let geometry = Geometry::polygon(vec![
            [-121.5, 38.2],
            [-121.1, 38.9],
            [-121.9, 38.4],
            [-121.5, 38.2],
        ]);
        let bbox = geometry.bounding_box().unwrap();
        assert_eq!(bbox.min_lon, -121.9);
        assert_eq!(bbox.max_lon, -121.1);
        assert_eq!(bbox.min_lat, 38.2);
        assert_eq!(bbox.max_lat, 38.9);
        let mean_lat = geometry.mean_vertex_latitude().unwrap();
        assert!((mean_lat - 38.425).abs() < 1e-9);
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rings() {
        let open = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert!(open.validate().unwrap_err().contains("not closed"));

        let short = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert!(short.validate().is_err());

        let out_of_range = Geometry::rectangle(170.0, 80.0, 190.0, 85.0);
        assert!(out_of_range.validate().is_err());

        let empty = Geometry::Polygon { coordinates: vec![] };
        assert!(empty.validate().is_err());
        assert!(empty.bounding_box().is_none());
        assert!(empty.mean_vertex_latitude().is_none());
    }
}

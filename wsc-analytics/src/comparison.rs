use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use wsc_core::Measurement;
use wsc_utils::numeric::round_to;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub waterbody_id: String,
    pub name: String,
    pub surface_area_hectares: f64,
    pub timestamp: DateTime<Utc>,
}

/// Latest area of each waterbody, largest first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comparison {
    pub generated_at: DateTime<Utc>,
    pub waterbodies: Vec<ComparisonEntry>,
    pub total_area_hectares: f64,
}

pub fn compare_latest(latest: Vec<Measurement>, now: DateTime<Utc>) -> Comparison {
    let mut waterbodies: Vec<ComparisonEntry> = latest
        .into_iter()
        .map(|m| ComparisonEntry {
            waterbody_id: m.waterbody_id,
            name: m.name,
            surface_area_hectares: m.surface_area_hectares,
            timestamp: m.timestamp,
        })
        .collect();
    waterbodies.sort_by(|a, b| {
        b.surface_area_hectares
            .partial_cmp(&a.surface_area_hectares)
            .unwrap_or(Ordering::Equal)
    });
    let total: f64 = waterbodies.iter().map(|w| w.surface_area_hectares).sum();
    Comparison {
        generated_at: now,
        waterbodies,
        total_area_hectares: round_to(total, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::fixtures::monthly;

    #[test]
    fn test_sorted_largest_first_with_total() {
        let latest = vec![
            monthly("mead", &[41_250.5]).remove(0),
            monthly("powell", &[55_000.25]).remove(0),
            monthly("pond", &[3.0]).remove(0),
        ];
        let now = Utc::now();
        let comparison = compare_latest(latest, now);
        let ids: Vec<&str> = comparison
            .waterbodies
            .iter()
            .map(|w| w.waterbody_id.as_str())
            .collect();
        assert_eq!(ids, vec!["powell", "mead", "pond"]);
        assert_eq!(comparison.total_area_hectares, 96_253.75);
        assert_eq!(comparison.generated_at, now);
    }

    #[test]
    fn test_empty() {
        let comparison = compare_latest(Vec::new(), Utc::now());
        assert!(comparison.waterbodies.is_empty());
        assert_eq!(comparison.total_area_hectares, 0.0);
    }
}

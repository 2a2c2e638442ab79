use crate::{
    error::AnalyticsError,
    series::{chronological, require_points},
};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use wsc_core::Measurement;
use wsc_utils::numeric::{mean, round_to};

/// Drought risk from the deviation of the current area below baseline.
///
/// Ordered by severity, `Low` least severe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Descending cascade; each boundary belongs to the less severe level.
    pub fn from_percentage_change(percentage_change: f64) -> Self {
        if percentage_change >= -5.0 {
            RiskLevel::Low
        } else if percentage_change >= -15.0 {
            RiskLevel::Medium
        } else if percentage_change >= -30.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroughtTrend {
    Increasing,
    Stable,
    Declining,
}

impl DroughtTrend {
    /// Compares the mean of the later half of `areas` with the earlier half.
    /// The split is at `len / 2`, the later half taking the middle point.
    pub fn from_halves(areas: &[f64]) -> Self {
        let (older, recent) = areas.split_at(areas.len() / 2);
        match (mean(older), mean(recent)) {
            (Some(older), Some(recent)) if recent > older * 1.02 => DroughtTrend::Increasing,
            (Some(older), Some(recent)) if recent < older * 0.98 => DroughtTrend::Declining,
            _ => DroughtTrend::Stable,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DroughtAssessment {
    pub waterbody_id: String,
    pub name: String,
    pub current_area: f64,
    pub baseline_area: f64,
    pub percentage_change: f64,
    pub risk_level: RiskLevel,
    pub trend: DroughtTrend,
    pub last_updated: DateTime<Utc>,
}

/// Classifies drought risk for one waterbody's series.
///
/// Baseline is the mean area over the whole series, current is the latest
/// point. Classification uses unrounded values; the reported areas and
/// percentage are rounded to two decimals.
pub fn assess_drought(series: &[Measurement]) -> Result<DroughtAssessment, AnalyticsError> {
    require_points(series)?;
    let ordered = chronological(series);
    let areas: Vec<f64> = ordered.iter().map(|m| m.surface_area_hectares).collect();
    let latest = ordered[ordered.len() - 1];

    let baseline = mean(&areas).unwrap_or(0.0);
    if baseline <= 0.0 {
        return Err(AnalyticsError::ZeroBaseline(latest.waterbody_id.clone()));
    }
    let current = latest.surface_area_hectares;
    let percentage_change = (current - baseline) / baseline * 100.0;
    let risk_level = RiskLevel::from_percentage_change(percentage_change);
    let trend = DroughtTrend::from_halves(&areas);
    debug!(
        "{}: baseline {:.2} ha, current {:.2} ha, {:+.2}% -> {:?}/{:?}",
        latest.waterbody_id, baseline, current, percentage_change, risk_level, trend
    );

    Ok(DroughtAssessment {
        waterbody_id: latest.waterbody_id.clone(),
        name: latest.name.clone(),
        current_area: round_to(current, 2),
        baseline_area: round_to(baseline, 2),
        percentage_change: round_to(percentage_change, 2),
        risk_level,
        trend,
        last_updated: latest.timestamp,
    })
}

/// Most severe first; order within a level is preserved.
pub fn rank_by_risk(mut assessments: Vec<DroughtAssessment>) -> Vec<DroughtAssessment> {
    assessments.sort_by_key(|a| Reverse(a.risk_level));
    assessments
}

use crate::{
    error::AnalyticsError,
    series::{chronological, require_points},
};
use serde::{Deserialize, Serialize};
use wsc_core::Measurement;
use wsc_utils::numeric::round_to;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn from_percentage_change(percentage_change: f64) -> Self {
        if percentage_change > 2.0 {
            TrendDirection::Up
        } else if percentage_change < -2.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrendAssessment {
    pub waterbody_id: String,
    pub name: String,
    pub period_months: u32,
    pub start_area: f64,
    pub end_area: f64,
    pub total_change: f64,
    pub percentage_change: f64,
    pub average_monthly_change: f64,
    pub trend_direction: TrendDirection,
}

/// Change between the first and last points of the series, spread over
/// `period_months`.
pub fn assess_trend(
    series: &[Measurement],
    period_months: u32,
) -> Result<TrendAssessment, AnalyticsError> {
    require_points(series)?;
    if period_months == 0 {
        return Err(AnalyticsError::InvalidPeriod);
    }
    let ordered = chronological(series);
    let first = ordered[0];
    let last = ordered[ordered.len() - 1];

    let start_area = first.surface_area_hectares;
    let end_area = last.surface_area_hectares;
    if start_area <= 0.0 {
        return Err(AnalyticsError::ZeroBaseline(last.waterbody_id.clone()));
    }
    let total_change = end_area - start_area;
    let percentage_change = total_change / start_area * 100.0;
    let average_monthly_change = total_change / f64::from(period_months);

    Ok(TrendAssessment {
        waterbody_id: last.waterbody_id.clone(),
        name: last.name.clone(),
        period_months,
        start_area: round_to(start_area, 2),
        end_area: round_to(end_area, 2),
        total_change: round_to(total_change, 2),
        percentage_change: round_to(percentage_change, 2),
        average_monthly_change: round_to(average_monthly_change, 2),
        trend_direction: TrendDirection::from_percentage_change(percentage_change),
    })
}

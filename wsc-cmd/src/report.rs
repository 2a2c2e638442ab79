//! Read-side commands: listings, series and analytics over stored
//! measurements.

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use log::warn;
use serde::Serialize;
use wsc_analytics::{
    assess_drought, assess_trend, build_timeseries, compare_latest, rank_by_risk,
    series::measured_only, AnalyticsError, Comparison, DroughtAssessment, Timeseries,
    TrendAssessment,
};
use wsc_core::{AreaStatistics, Measurement, MeasurementRepository};
use wsc_utils::dates::{DateWindow, DAYS_PER_MONTH};
use wsc_utils::numeric::round_to;

/// Look-back used for surface area statistics.
pub const STATISTICS_WINDOW_DAYS: i64 = 365;

/// Latest reading plus statistics over the past year.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SurfaceAreaReport {
    pub waterbody_id: String,
    pub name: String,
    pub latest: Measurement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<AreaStatistics>,
}

pub fn list_waterbodies<R: MeasurementRepository>(repo: &R) -> anyhow::Result<Vec<String>> {
    Ok(repo.list_distinct_waterbody_ids()?.into_iter().collect())
}

pub fn latest_measurement<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: &str,
) -> anyhow::Result<Measurement> {
    repo.latest(waterbody_id)?
        .ok_or_else(|| anyhow!("No measurements for waterbody '{}'", waterbody_id))
}

/// Series over explicit dates when given, otherwise the trailing
/// `months_back` 30-day months ending `today`.
pub fn timeseries<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    months_back: u32,
    today: NaiveDate,
) -> anyhow::Result<Timeseries> {
    let end = end.unwrap_or(today);
    let window = match start {
        Some(start) => DateWindow::new(start, end)?,
        None => DateWindow::months_back(end, months_back)?,
    };
    let (start, end) = (window.start_instant(), window.end_instant());
    let series = repo.query(waterbody_id, start, end)?;
    Ok(build_timeseries(waterbody_id, start, end, &series))
}

pub fn surface_area<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<SurfaceAreaReport> {
    let latest = latest_measurement(repo, waterbody_id)?;
    let since = now - TimeDelta::days(STATISTICS_WINDOW_DAYS);
    let statistics = repo
        .statistics(waterbody_id, since, now)?
        .map(|s| AreaStatistics {
            min: round_to(s.min, 2),
            max: round_to(s.max, 2),
            avg: round_to(s.avg, 2),
            count: s.count,
        });
    Ok(SurfaceAreaReport {
        waterbody_id: waterbody_id.to_string(),
        name: latest.name.clone(),
        latest,
        statistics,
    })
}

fn load_series<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_degraded: bool,
) -> anyhow::Result<Vec<Measurement>> {
    let series = repo.query(waterbody_id, start, end)?;
    Ok(if include_degraded {
        series
    } else {
        measured_only(series)
    })
}

/// Drought assessment for one waterbody, or for every stored waterbody
/// ranked most severe first. In the latter case waterbodies without enough
/// usable data are skipped.
pub fn drought_risk<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: Option<&str>,
    window_days: u32,
    include_degraded: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<DroughtAssessment>> {
    let window = DateWindow::days_back(now.date_naive(), window_days)?;
    let (start, end) = (window.start_instant(), window.end_instant());
    if let Some(id) = waterbody_id {
        let series = load_series(repo, id, start, end, include_degraded)?;
        return Ok(vec![assess_drought(&series)?]);
    }
    let mut assessments = Vec::new();
    for id in repo.list_distinct_waterbody_ids()? {
        let series = load_series(repo, &id, start, end, include_degraded)?;
        match assess_drought(&series) {
            Ok(assessment) => assessments.push(assessment),
            Err(e @ AnalyticsError::InsufficientData { .. })
            | Err(e @ AnalyticsError::ZeroBaseline(_)) => {
                warn!("Skipping {}: {}", id, e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(rank_by_risk(assessments))
}

/// Trend over the trailing `months` 30-day months.
pub fn trend<R: MeasurementRepository>(
    repo: &R,
    waterbody_id: &str,
    months: u32,
    include_degraded: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<TrendAssessment> {
    let start = TimeDelta::try_days(DAYS_PER_MONTH * i64::from(months))
        .and_then(|period| now.checked_sub_signed(period))
        .ok_or_else(|| anyhow!("trend period of {} months is out of range", months))?;
    let series = load_series(repo, waterbody_id, start, now, include_degraded)?;
    Ok(assess_trend(&series, months)?)
}

/// Latest reading of every stored waterbody, largest first.
pub fn compare<R: MeasurementRepository>(
    repo: &R,
    now: DateTime<Utc>,
) -> anyhow::Result<Comparison> {
    let mut latest = Vec::new();
    for id in repo.list_distinct_waterbody_ids()? {
        if let Some(m) = repo.latest(&id)? {
            latest.push(m);
        }
    }
    Ok(compare_latest(latest, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wsc_analytics::{RiskLevel, TrendDirection};
    use wsc_core::{Geometry, WaterbodyConfig};
    use wsc_db::Database;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn write_series(db: &Database, id: &str, areas: &[f64]) {
        let lake = WaterbodyConfig::new(id, &format!("Lake {id}"), Geometry::rectangle(0.0, 0.0, 1.0, 1.0));
        let n = areas.len() as i64;
        for (i, &area) in areas.iter().enumerate() {
            let when = now() - TimeDelta::days(30 * (n - i as i64));
            db.write(&Measurement::new(&lake, when, area)).unwrap();
        }
    }

    fn sample_db() -> Database {
        let db = Database::new().unwrap();
        write_series(&db, "steady", &[100.0, 100.0, 101.0]);
        write_series(&db, "shrinking", &[140.0, 100.0, 60.0]);
        write_series(&db, "single", &[50.0]);
        db
    }

    #[test]
    fn drought_risk_ranks_and_skips_sparse_waterbodies() {
        let db = sample_db();
        let ranked = drought_risk(&db, None, 365, false, now()).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|a| a.waterbody_id.as_str()).collect();
        assert_eq!(ids, vec!["shrinking", "steady"]);
        assert_eq!(ranked[0].risk_level, RiskLevel::Critical);
        assert_eq!(ranked[1].risk_level, RiskLevel::Low);

        assert!(drought_risk(&db, Some("single"), 365, false, now()).is_err());
    }

    #[test]
    fn degraded_rows_are_excluded_unless_requested() {
        let db = sample_db();
        let lake = WaterbodyConfig::new("steady", "Lake steady", Geometry::rectangle(0.0, 0.0, 1.0, 1.0));
        db.write(&Measurement::new(&lake, now() - TimeDelta::days(1), 0.0).with_processing_error("bad payload"))
            .unwrap();

        let clean = drought_risk(&db, Some("steady"), 365, false, now()).unwrap();
        assert_eq!(clean[0].current_area, 101.0);
        let raw = drought_risk(&db, Some("steady"), 365, true, now()).unwrap();
        assert_eq!(raw[0].current_area, 0.0);
        assert_eq!(raw[0].risk_level, RiskLevel::Critical);
    }

    #[test]
    fn trend_over_trailing_months() {
        let db = sample_db();
        let assessment = trend(&db, "shrinking", 12, false, now()).unwrap();
        assert_eq!(assessment.start_area, 140.0);
        assert_eq!(assessment.end_area, 60.0);
        assert_eq!(assessment.trend_direction, TrendDirection::Down);
        assert_eq!(assessment.average_monthly_change, -6.67);
    }

    #[test]
    fn compare_lists_latest_largest_first() {
        let db = sample_db();
        let comparison = compare(&db, now()).unwrap();
        let ids: Vec<&str> = comparison
            .waterbodies
            .iter()
            .map(|w| w.waterbody_id.as_str())
            .collect();
        assert_eq!(ids, vec!["steady", "shrinking", "single"]);
        assert_eq!(comparison.total_area_hectares, 211.0);
    }

    #[test]
    fn surface_area_reports_latest_and_statistics() {
        let db = sample_db();
        let report = surface_area(&db, "shrinking", now()).unwrap();
        assert_eq!(report.latest.surface_area_hectares, 60.0);
        let stats = report.statistics.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 60.0);
        assert_eq!(stats.max, 140.0);
        assert_eq!(stats.avg, 100.0);

        assert!(surface_area(&db, "missing", now()).is_err());
    }

    #[test]
    fn timeseries_windows() {
        let db = sample_db();
        let today = now().date_naive();
        let trailing = timeseries(&db, "shrinking", None, None, 12, today).unwrap();
        assert_eq!(trailing.count, 3);
        assert_eq!(trailing.name, "Lake shrinking");

        let last_month = timeseries(&db, "shrinking", None, None, 1, today).unwrap();
        assert_eq!(last_month.count, 1);

        let explicit = timeseries(
            &db,
            "shrinking",
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()),
            12,
            today,
        )
        .unwrap();
        assert_eq!(explicit.count, 2);

        assert!(timeseries(
            &db,
            "shrinking",
            Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()),
            12,
            today,
        )
        .is_err());
    }

    #[test]
    fn oversized_windows_are_errors() {
        let db = sample_db();
        assert!(drought_risk(&db, None, u32::MAX, false, now()).is_err());
        assert!(timeseries(&db, "steady", None, None, u32::MAX, now().date_naive()).is_err());
        assert!(trend(&db, "steady", u32::MAX, false, now()).is_err());
    }

    #[test]
    fn list_and_latest() {
        let db = sample_db();
        assert_eq!(list_waterbodies(&db).unwrap(), vec!["shrinking", "single", "steady"]);
        assert_eq!(latest_measurement(&db, "single").unwrap().surface_area_hectares, 50.0);
        assert!(latest_measurement(&db, "missing").is_err());
    }
}

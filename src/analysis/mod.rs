//! Segment-time aggregation. Everything here is a pure function of the data it receives: the
//! same snapshot and request always produce the same tables.
//!
//! The pipeline is:
//!  - [summary::compute_session_summary] turns each closed session into segments.
//!  - Sessions are bucketed by their anchor date (day of the last visited waypoint).
//!  - [daily::build_daily_table] sums segments per day, [weekly::build_weekly_table] averages
//!    them per 7 day bucket.
//!  - [totals::build_totals_series] and [totals::moving_average] describe total commute time.

pub mod daily;
pub mod summary;
pub mod table;
pub mod totals;
pub mod weekly;

use std::fmt::Display;

use chrono::{NaiveDate, TimeZone};
use clap::ValueEnum;
use serde::Serialize;
use summary::{compute_session_summary, ArrivalPolicy, SessionSummary};
use table::{collect_segment_names, SegmentTable};
use totals::{build_totals_series, moving_average, TotalPoint, DEFAULT_MOVING_AVERAGE_WINDOW};
use tracing::{debug, instrument};
use weekly::build_weekly_buckets;

use crate::storage::entities::RouteSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Daily,
    Weekly,
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Daily => write!(f, "daily"),
            ViewMode::Weekly => write!(f, "weekly"),
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub moving_average_window: usize,
    pub arrival_policy: ArrivalPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            arrival_policy: ArrivalPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub range: DateRange,
    pub mode: ViewMode,
    pub config: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub range: DateRange,
    pub mode: ViewMode,
    /// Number of sessions anchored inside the range.
    pub session_count: usize,
    /// Daily or weekly table depending on `mode`.
    pub stacked: SegmentTable,
    pub totals: Vec<TotalPoint>,
    /// Same length as `totals`.
    pub moving_average: Vec<f64>,
}

impl AnalysisReport {
    fn empty(request: &AnalysisRequest) -> Self {
        Self {
            range: request.range,
            mode: request.mode,
            session_count: 0,
            stacked: SegmentTable::default(),
            totals: vec![],
            moving_average: vec![],
        }
    }
}

/// Summaries of closed sessions anchored inside `range`, sorted by anchor date and then
/// session id.
pub fn summarize_sessions<Tz: TimeZone>(
    snapshot: &RouteSnapshot,
    range: DateRange,
    policy: ArrivalPolicy,
    tz: &Tz,
) -> Vec<SessionSummary> {
    let mut sessions = snapshot
        .sessions
        .iter()
        .filter(|v| v.is_closed())
        .collect::<Vec<_>>();
    sessions.sort_by_key(|v| v.id);

    let mut summaries = sessions
        .into_iter()
        .map(|session| {
            compute_session_summary(session, &snapshot.arrivals, &snapshot.waypoints, policy, tz)
        })
        .filter(|v| v.anchor_date.is_some_and(|date| range.contains(date)))
        .collect::<Vec<_>>();
    summaries.sort_by_key(|v| (v.anchor_date, v.session_id));
    summaries
}

#[instrument(skip(snapshot, tz))]
pub fn analyze<Tz: TimeZone>(
    snapshot: &RouteSnapshot,
    request: &AnalysisRequest,
    tz: &Tz,
) -> AnalysisReport {
    let summaries = summarize_sessions(
        snapshot,
        request.range,
        request.config.arrival_policy,
        tz,
    );
    debug!(
        "{} of {} sessions fall into the range",
        summaries.len(),
        snapshot.sessions.len()
    );
    if summaries.is_empty() {
        return AnalysisReport::empty(request);
    }

    let segment_names = collect_segment_names(&summaries);

    let stacked = match request.mode {
        ViewMode::Daily => daily::build_daily_table(&summaries, &segment_names),
        ViewMode::Weekly => {
            let buckets = build_weekly_buckets(request.range.start, request.range.end);
            weekly::build_weekly_table(&summaries, &buckets, &segment_names)
        }
    };

    let totals = build_totals_series(&summaries);
    let moving_average = moving_average(
        &totals.iter().map(|v| v.total_minutes).collect::<Vec<_>>(),
        request.config.moving_average_window,
    );

    AnalysisReport {
        range: request.range,
        mode: request.mode,
        session_count: summaries.len(),
        stacked,
        totals,
        moving_average,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};

    use crate::{
        analysis::summary::test_data::{arrival, at, closed_session, waypoints},
        storage::entities::{RouteSnapshot, Session},
        utils::logging::TEST_LOGGING,
    };

    use super::{analyze, AnalysisConfig, AnalysisRequest, DateRange, ViewMode};

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn request(mode: ViewMode, start: u32, end: u32) -> AnalysisRequest {
        AnalysisRequest {
            range: DateRange::new(day(start), day(end)),
            mode,
            config: AnalysisConfig::default(),
        }
    }

    /// Route A→B→C. Sessions 1 and 2 on the 3rd, session 3 on the 9th skips B, session 4 is
    /// still open, session 5 only reached A.
    fn snapshot() -> RouteSnapshot {
        let mut sessions = vec![
            closed_session(1, at(3, 8, 0)),
            closed_session(2, at(3, 18, 0)),
            closed_session(3, at(9, 8, 0)),
            closed_session(5, at(10, 8, 0)),
        ];
        sessions.push(Session {
            id: 4,
            route_id: 1,
            started_at: at(9, 18, 0),
            ended_at: None,
        });
        RouteSnapshot {
            waypoints: waypoints(&["A", "B", "C"]),
            sessions,
            arrivals: vec![
                arrival(1, 1, at(3, 8, 0)),
                arrival(1, 2, at(3, 8, 10)),
                arrival(1, 3, at(3, 8, 30)),
                arrival(2, 1, at(3, 18, 0)),
                arrival(2, 2, at(3, 18, 14)),
                arrival(2, 3, at(3, 18, 20)),
                arrival(3, 1, at(9, 8, 0)),
                arrival(3, 3, at(9, 8, 0) + Duration::minutes(25)),
                arrival(4, 1, at(9, 18, 0)),
                arrival(4, 2, at(9, 18, 5)),
                arrival(5, 1, at(10, 8, 0)),
            ],
        }
    }

    #[test]
    fn daily_report() {
        *TEST_LOGGING;
        let report = analyze(&snapshot(), &request(ViewMode::Daily, 1, 10), &Utc);

        assert_eq!(report.session_count, 3);
        assert_eq!(report.stacked.columns, vec!["A→B", "B→C", "A→C"]);
        assert_eq!(
            report.stacked.row_keys().collect::<Vec<_>>(),
            vec!["2024-01-03", "2024-01-09"]
        );
        assert_eq!(report.stacked.value("2024-01-03", "A→B"), Some(24.));
        assert_eq!(report.stacked.value("2024-01-03", "B→C"), Some(26.));
        assert_eq!(report.stacked.value("2024-01-03", "A→C"), Some(0.));
        assert_eq!(report.stacked.value("2024-01-09", "A→C"), Some(25.));
        assert_eq!(
            report
                .totals
                .iter()
                .map(|v| (v.session_id, v.total_minutes))
                .collect::<Vec<_>>(),
            vec![(1, 30.), (2, 20.), (3, 25.)]
        );
        assert_eq!(report.moving_average, vec![30., 25., 25.]);
    }

    #[test]
    fn weekly_report() {
        let report = analyze(&snapshot(), &request(ViewMode::Weekly, 1, 10), &Utc);

        assert_eq!(
            report.stacked.row_keys().collect::<Vec<_>>(),
            vec!["2024-01-01〜2024-01-07", "2024-01-08〜2024-01-10"]
        );
        assert_eq!(report.stacked.value("2024-01-01〜2024-01-07", "A→B"), Some(12.));
        assert_eq!(report.stacked.value("2024-01-01〜2024-01-07", "B→C"), Some(13.));
        assert_eq!(report.stacked.value("2024-01-08〜2024-01-10", "A→C"), Some(25.));
        assert_eq!(report.stacked.value("2024-01-08〜2024-01-10", "A→B"), Some(0.));
        assert_eq!(report.totals.len(), report.moving_average.len());
    }

    #[test]
    fn range_filters_by_anchor_date() {
        let report = analyze(&snapshot(), &request(ViewMode::Daily, 4, 10), &Utc);

        assert_eq!(report.session_count, 1);
        assert_eq!(report.stacked.columns, vec!["A→C"]);
        assert_eq!(report.totals[0].session_id, 3);
    }

    #[test]
    fn degenerate_inputs_give_empty_reports() {
        let mut no_waypoints = snapshot();
        no_waypoints.waypoints.clear();
        let no_sessions = RouteSnapshot {
            sessions: vec![],
            ..snapshot()
        };

        for (snapshot, request) in [
            (no_waypoints, request(ViewMode::Weekly, 1, 10)),
            (no_sessions, request(ViewMode::Daily, 1, 10)),
            (snapshot(), request(ViewMode::Weekly, 10, 1)),
            (snapshot(), request(ViewMode::Daily, 20, 25)),
        ] {
            let report = analyze(&snapshot, &request, &Utc);
            assert_eq!(report.session_count, 0);
            assert!(report.stacked.is_empty());
            assert!(report.stacked.columns.is_empty());
            assert!(report.totals.is_empty());
            assert!(report.moving_average.is_empty());
        }
    }

    #[test]
    fn analysis_is_idempotent() {
        let data = snapshot();
        let request = request(ViewMode::Weekly, 1, 10);
        assert_eq!(analyze(&data, &request, &Utc), analyze(&data, &request, &Utc));
    }
}

use chrono::NaiveDate;
use serde::Serialize;

use crate::storage::entities::SessionId;

use super::summary::SessionSummary;

pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalPoint {
    pub date: NaiveDate,
    pub session_id: SessionId,
    pub total_minutes: f64,
}

/// One point per session, not per day. Sorted by anchor date, sessions of the same day by id.
pub fn build_totals_series(summaries: &[SessionSummary]) -> Vec<TotalPoint> {
    let mut series = summaries
        .iter()
        .filter_map(|v| {
            v.anchor_date.map(|date| TotalPoint {
                date,
                session_id: v.session_id,
                total_minutes: v.total_minutes,
            })
        })
        .collect::<Vec<_>>();
    series.sort_by_key(|v| (v.date, v.session_id));
    series
}

/// Trailing average over the previous `window` entries. The first entries average over what is
/// available, so the output always has the same length as `series`. The window counts entries,
/// not calendar days.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..series.len())
        .map(|i| {
            let slice = &series[(i + 1).saturating_sub(window)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::{
    storage::entities::{Arrival, PlaceId, Session, SessionId, Waypoint},
    utils::time::{local_date, minutes_between},
};

/// Decides which timestamp wins when a waypoint was reached more than once in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrivalPolicy {
    /// Later records overwrite earlier ones.
    #[default]
    LastWins,
    /// Only the first record is kept.
    FirstWins,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// `"A→B"` built from the waypoint names.
    pub label: String,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub segments: Vec<Segment>,
    pub total_minutes: f64,
    /// Day of the last visited waypoint. Absent when fewer than 2 waypoints were visited, such
    /// summaries don't take part in analysis.
    pub anchor_date: Option<NaiveDate>,
}

impl SessionSummary {
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            segments: vec![],
            total_minutes: 0.,
            anchor_date: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor_date.is_none()
    }

    /// Minutes of the first segment with `label`.
    pub fn minutes_for(&self, label: &str) -> Option<f64> {
        self.segments
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.minutes)
    }
}

struct Visit<'a> {
    name: &'a str,
    ts: DateTime<Utc>,
}

/// Turns the arrivals of one session into segments.
///
/// Visits follow route order, not the order in which the waypoints were actually reached. A
/// session that skipped a waypoint gets a segment spanning the gap, and a session that reached
/// waypoints out of order gets negative segments. Arrivals of other sessions and of waypoints
/// outside `waypoints` are ignored.
pub fn compute_session_summary<'a, Tz: TimeZone>(
    session: &Session,
    arrivals: impl IntoIterator<Item = &'a Arrival>,
    waypoints: &[Waypoint],
    policy: ArrivalPolicy,
    tz: &Tz,
) -> SessionSummary {
    let mut reached = HashMap::<PlaceId, DateTime<Utc>>::new();
    for arrival in arrivals
        .into_iter()
        .filter(|v| v.session_id == session.id)
    {
        match policy {
            ArrivalPolicy::LastWins => {
                reached.insert(arrival.place_id, arrival.ts);
            }
            ArrivalPolicy::FirstWins => {
                reached.entry(arrival.place_id).or_insert(arrival.ts);
            }
        }
    }

    let mut ordered = waypoints.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|v| v.order);

    let visits = ordered
        .into_iter()
        .filter_map(|waypoint| {
            reached.get(&waypoint.id).map(|ts| Visit {
                name: &waypoint.name,
                ts: *ts,
            })
        })
        .collect::<Vec<_>>();

    let [first, .., last] = visits.as_slice() else {
        return SessionSummary::empty(session.id);
    };

    let segments = visits
        .windows(2)
        .map(|pair| Segment {
            label: format!("{}→{}", pair[0].name, pair[1].name),
            minutes: minutes_between(pair[0].ts, pair[1].ts),
        })
        .collect();

    SessionSummary {
        session_id: session.id,
        segments,
        total_minutes: minutes_between(first.ts, last.ts),
        anchor_date: Some(local_date(last.ts, tz)),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RouteId = u64;
pub type PlaceId = u64;
pub type SessionId = u64;
pub type ArrivalId = u64;

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
}

/// A named stop along a route. `order` is the 0-based position in the route and is unique
/// within it.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Waypoint {
    pub id: PlaceId,
    pub route_id: RouteId,
    pub order: u32,
    pub name: String,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SessionState {
    Open,
    Closed,
}

/// One commute. A session is open until `ended_at` is set, only closed sessions are used in
/// analysis.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub id: SessionId,
    pub route_id: RouteId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self.ended_at {
            Some(_) => SessionState::Closed,
            None => SessionState::Open,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }
}

/// Manually recorded moment of reaching a waypoint during a session.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Arrival {
    pub id: ArrivalId,
    pub session_id: SessionId,
    pub place_id: PlaceId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

/// Everything the application stores. Persisted as a single document by
/// [JsonFileStore](super::store::JsonFileStore).
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct Database {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub places: Vec<Waypoint>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub arrivals: Vec<Arrival>,
}

impl Database {
    pub fn next_route_id(&self) -> RouteId {
        self.routes.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn next_place_id(&self) -> PlaceId {
        self.places.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn next_session_id(&self) -> SessionId {
        self.sessions.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn next_arrival_id(&self) -> ArrivalId {
        self.arrivals.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn route(&self, route_id: RouteId) -> Option<&Route> {
        self.routes.iter().find(|v| v.id == route_id)
    }

    /// Waypoints of a route sorted by `order`.
    pub fn waypoints(&self, route_id: RouteId) -> Vec<Waypoint> {
        let mut waypoints = self
            .places
            .iter()
            .filter(|v| v.route_id == route_id)
            .cloned()
            .collect::<Vec<_>>();
        waypoints.sort_by_key(|v| v.order);
        waypoints
    }

    pub fn active_session(&self, route_id: RouteId) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|v| v.route_id == route_id && v.state() == SessionState::Open)
    }

    pub fn arrivals_for(&self, session_id: SessionId) -> impl Iterator<Item = &Arrival> {
        self.arrivals
            .iter()
            .filter(move |v| v.session_id == session_id)
    }

    /// Extracts everything the analysis needs for one route. Sessions are ordered by id.
    pub fn snapshot(&self, route_id: RouteId) -> RouteSnapshot {
        let waypoints = self.waypoints(route_id);
        let mut sessions = self
            .sessions
            .iter()
            .filter(|v| v.route_id == route_id)
            .cloned()
            .collect::<Vec<_>>();
        sessions.sort_by_key(|v| v.id);
        let arrivals = self
            .arrivals
            .iter()
            .filter(|a| sessions.iter().any(|s| s.id == a.session_id))
            .cloned()
            .collect();
        RouteSnapshot {
            waypoints,
            sessions,
            arrivals,
        }
    }
}

/// Consistent view of a single route handed to the analysis.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct RouteSnapshot {
    pub waypoints: Vec<Waypoint>,
    pub sessions: Vec<Session>,
    pub arrivals: Vec<Arrival>,
}

//! Collaborators that write data: session bookkeeping and route editing. Both operate on an
//! explicit [RouteContext] instead of a globally selected route.

pub mod route;

use thiserror::Error;
use tracing::info;

use crate::{
    storage::{
        entities::{Arrival, PlaceId, RouteId, Session, SessionId, Waypoint},
        store::CommuteStore,
    },
    utils::clock::Clock,
};

/// The route every operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteContext {
    pub route_id: RouteId,
}

impl RouteContext {
    pub fn new(route_id: RouteId) -> Self {
        Self { route_id }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordingError {
    #[error("session {0} is already running")]
    AlreadyActive(SessionId),
    #[error("there is no running session")]
    NoActiveSession,
    #[error("route {0} doesn't exist")]
    UnknownRoute(RouteId),
    #[error("waypoint {0} is not part of the route")]
    UnknownPlace(PlaceId),
    #[error("waypoint {0} was already reached in this session")]
    AlreadyArrived(PlaceId),
}

/// Waypoint of a running session and when it was reached, if it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaypointProgress {
    pub waypoint: Waypoint,
    pub arrival: Option<Arrival>,
}

/// Owns the session state machine. A route has at most one open session, sessions move from
/// open to closed exactly once and arrivals are only accepted while a session is open.
pub struct SessionRecorder<S, C> {
    store: S,
    clock: C,
}

impl<S: CommuteStore, C: Clock> SessionRecorder<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub async fn active_session(&self, context: RouteContext) -> anyhow::Result<Option<Session>> {
        Ok(self
            .store
            .load()
            .await?
            .active_session(context.route_id)
            .cloned())
    }

    pub async fn start_session(&self, context: RouteContext) -> anyhow::Result<Session> {
        let now = self.clock.time();
        let session = self
            .store
            .update(|db| {
                if db.route(context.route_id).is_none() {
                    return Err(RecordingError::UnknownRoute(context.route_id).into());
                }
                if let Some(active) = db.active_session(context.route_id) {
                    return Err(RecordingError::AlreadyActive(active.id).into());
                }
                let session = Session {
                    id: db.next_session_id(),
                    route_id: context.route_id,
                    started_at: now,
                    ended_at: None,
                };
                db.sessions.push(session.clone());
                Ok(session)
            })
            .await?;
        info!("Started session {}", session.id);
        Ok(session)
    }

    pub async fn end_session(&self, context: RouteContext) -> anyhow::Result<Session> {
        let now = self.clock.time();
        let session = self
            .store
            .update(|db| {
                let active_id = db
                    .active_session(context.route_id)
                    .map(|v| v.id)
                    .ok_or(RecordingError::NoActiveSession)?;
                let session = db
                    .sessions
                    .iter_mut()
                    .find(|v| v.id == active_id)
                    .ok_or(RecordingError::NoActiveSession)?;
                session.ended_at = Some(now);
                Ok(session.clone())
            })
            .await?;
        info!("Ended session {}", session.id);
        Ok(session)
    }

    /// Stamps the arrival at `place_id` with the current time.
    pub async fn record_arrival(
        &self,
        context: RouteContext,
        place_id: PlaceId,
    ) -> anyhow::Result<Arrival> {
        let now = self.clock.time();
        let arrival = self
            .store
            .update(|db| {
                let session_id = db
                    .active_session(context.route_id)
                    .map(|v| v.id)
                    .ok_or(RecordingError::NoActiveSession)?;
                if !db
                    .places
                    .iter()
                    .any(|v| v.id == place_id && v.route_id == context.route_id)
                {
                    return Err(RecordingError::UnknownPlace(place_id).into());
                }
                if db.arrivals_for(session_id).any(|v| v.place_id == place_id) {
                    return Err(RecordingError::AlreadyArrived(place_id).into());
                }
                let arrival = Arrival {
                    id: db.next_arrival_id(),
                    session_id,
                    place_id,
                    ts: now,
                };
                db.arrivals.push(arrival.clone());
                Ok(arrival)
            })
            .await?;
        info!(
            "Recorded arrival at {} for session {}",
            arrival.place_id, arrival.session_id
        );
        Ok(arrival)
    }

    /// The running session with every waypoint of the route in order.
    pub async fn progress(
        &self,
        context: RouteContext,
    ) -> anyhow::Result<Option<(Session, Vec<WaypointProgress>)>> {
        let db = self.store.load().await?;
        let Some(session) = db.active_session(context.route_id).cloned() else {
            return Ok(None);
        };
        let progress = db
            .waypoints(context.route_id)
            .into_iter()
            .map(|waypoint| {
                let arrival = db
                    .arrivals_for(session.id)
                    .find(|v| v.place_id == waypoint.id)
                    .cloned();
                WaypointProgress { waypoint, arrival }
            })
            .collect();
        Ok(Some((session, progress)))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        recording::route::ensure_default_route,
        storage::store::{CommuteStore, JsonFileStore},
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    use super::{RecordingError, RouteContext, SessionRecorder};

    fn ticking_clock() -> MockClock {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut minutes = 0;
        let mut clock = MockClock::new();
        clock.expect_time().returning(move || {
            let now = start + Duration::minutes(minutes);
            minutes += 5;
            now
        });
        clock
    }

    fn recording_error(error: anyhow::Error) -> RecordingError {
        error
            .downcast::<RecordingError>()
            .expect("should be a recording error")
    }

    #[tokio::test]
    async fn full_session_lifecycle() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        let context = ensure_default_route(&store).await?;
        let recorder = SessionRecorder::new(store, ticking_clock());

        let session = recorder.start_session(context).await?;
        assert!(recorder.active_session(context).await?.is_some());

        let (_, progress) = recorder.progress(context).await?.unwrap();
        let first = progress[0].waypoint.id;
        let last = progress.last().unwrap().waypoint.id;

        recorder.record_arrival(context, first).await?;
        recorder.record_arrival(context, last).await?;
        let ended = recorder.end_session(context).await?;

        assert_eq!(ended.id, session.id);
        assert!(ended.is_closed());
        assert_eq!(ended.ended_at, Some(session.started_at + Duration::minutes(15)));
        assert!(recorder.active_session(context).await?.is_none());
        assert!(recorder.progress(context).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn only_one_open_session_per_route() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        let context = ensure_default_route(&store).await?;
        let recorder = SessionRecorder::new(store, ticking_clock());

        let session = recorder.start_session(context).await?;
        let error = recorder.start_session(context).await.unwrap_err();

        assert_eq!(recording_error(error), RecordingError::AlreadyActive(session.id));
        Ok(())
    }

    #[tokio::test]
    async fn closed_routes_reject_arrivals_and_ending() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        let context = ensure_default_route(&store).await?;
        let recorder = SessionRecorder::new(store, ticking_clock());

        let error = recorder.end_session(context).await.unwrap_err();
        assert_eq!(recording_error(error), RecordingError::NoActiveSession);

        let error = recorder.record_arrival(context, 1).await.unwrap_err();
        assert_eq!(recording_error(error), RecordingError::NoActiveSession);

        let error = recorder
            .start_session(RouteContext::new(42))
            .await
            .unwrap_err();
        assert_eq!(recording_error(error), RecordingError::UnknownRoute(42));
        Ok(())
    }

    #[tokio::test]
    async fn arrivals_are_validated() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        let context = ensure_default_route(&store).await?;
        let place = store.load().await?.waypoints(context.route_id)[0].id;
        let recorder = SessionRecorder::new(store, ticking_clock());
        recorder.start_session(context).await?;

        recorder.record_arrival(context, place).await?;
        let error = recorder.record_arrival(context, place).await.unwrap_err();
        assert_eq!(recording_error(error), RecordingError::AlreadyArrived(place));

        let error = recorder.record_arrival(context, 999).await.unwrap_err();
        assert_eq!(recording_error(error), RecordingError::UnknownPlace(999));
        Ok(())
    }
}

use anyhow::{bail, Result};

use crate::{
    recording::{route::resolve_waypoint, RouteContext, SessionRecorder},
    storage::store::CommuteStore,
    utils::clock::Clock,
};

use super::render::Renderer;

pub async fn process_start_command<S: CommuteStore, C: Clock>(
    recorder: &SessionRecorder<S, C>,
    context: RouteContext,
) -> Result<()> {
    let session = recorder.start_session(context).await?;
    println!("Started session {}", session.id);
    Ok(())
}

pub async fn process_end_command<S: CommuteStore, C: Clock>(
    recorder: &SessionRecorder<S, C>,
    context: RouteContext,
) -> Result<()> {
    let session = recorder.end_session(context).await?;
    println!("Ended session {}", session.id);
    Ok(())
}

/// `place` is either the waypoint name or its position on the route, starting from 1.
pub async fn process_arrive_command<S: CommuteStore, C: Clock>(
    recorder: &SessionRecorder<S, C>,
    context: RouteContext,
    renderer: &Renderer,
    place: &str,
) -> Result<()> {
    let Some((_, progress)) = recorder.progress(context).await? else {
        bail!("There is no running session. Use `start` first");
    };
    let waypoints = progress
        .iter()
        .map(|v| v.waypoint.clone())
        .collect::<Vec<_>>();
    let Some(waypoint) = resolve_waypoint(&waypoints, place) else {
        bail!("Route has no waypoint {place:?}");
    };
    recorder.record_arrival(context, waypoint.id).await?;

    if let Some((session, progress)) = recorder.progress(context).await? {
        print!("{}", renderer.progress(&session, &progress));
    }
    Ok(())
}

pub async fn process_status_command<S: CommuteStore, C: Clock>(
    recorder: &SessionRecorder<S, C>,
    store: &S,
    context: RouteContext,
    renderer: &Renderer,
) -> Result<()> {
    match recorder.progress(context).await? {
        Some((session, progress)) => print!("{}", renderer.progress(&session, &progress)),
        None => {
            let db = store.load().await?;
            let last = db
                .sessions
                .iter()
                .filter(|v| v.route_id == context.route_id)
                .max_by_key(|v| v.id);
            print!("{}", renderer.idle(last));
        }
    }
    Ok(())
}

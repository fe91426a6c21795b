use std::collections::HashSet;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{
    entities::{Database, Route, RouteId, Waypoint},
    store::CommuteStore,
};

use super::RouteContext;

pub const DEFAULT_ROUTE_NAME: &str = "通勤ルート";
pub const DEFAULT_PLACES: [&str; 5] = ["家", "橋", "朝倉駅", "56号線", "会社"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteEditError {
    #[error("names can't be empty")]
    EmptyName,
    #[error("waypoint {0} is listed more than once")]
    DuplicateName(String),
    #[error("route has no waypoint named {0}")]
    UnknownWaypoint(String),
    #[error("route {0} doesn't exist")]
    UnknownRoute(RouteId),
}

/// Returns the first route, creating the default one with the default waypoints when the
/// database has none.
pub async fn ensure_default_route(store: &impl CommuteStore) -> Result<RouteContext> {
    if let Some(route) = store.load().await?.routes.iter().min_by_key(|v| v.id) {
        return Ok(RouteContext::new(route.id));
    }
    store.update(|db| Ok(ensure_default_route_in(db))).await
}

fn ensure_default_route_in(db: &mut Database) -> RouteContext {
    if let Some(route) = db.routes.iter().min_by_key(|v| v.id) {
        return RouteContext::new(route.id);
    }
    let route_id = db.next_route_id();
    db.routes.push(Route {
        id: route_id,
        name: DEFAULT_ROUTE_NAME.into(),
    });
    for (order, name) in DEFAULT_PLACES.iter().enumerate() {
        let id = db.next_place_id();
        db.places.push(Waypoint {
            id,
            route_id,
            order: order as u32,
            name: name.to_string(),
        });
    }
    info!("Created default route {route_id}");
    RouteContext::new(route_id)
}

pub async fn rename_route(
    store: &impl CommuteStore,
    context: RouteContext,
    name: &str,
) -> Result<Route> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(RouteEditError::EmptyName.into());
    }
    store
        .update(|db| {
            let route = db
                .routes
                .iter_mut()
                .find(|v| v.id == context.route_id)
                .ok_or(RouteEditError::UnknownRoute(context.route_id))?;
            route.name = name;
            Ok(route.clone())
        })
        .await
}

/// Replaces the waypoints of the route with `names`, in that order. Waypoints whose name is
/// kept retain their id so earlier arrivals still count.
pub async fn set_waypoints(
    store: &impl CommuteStore,
    context: RouteContext,
    names: &[String],
) -> Result<Vec<Waypoint>> {
    store
        .update(|db| apply_waypoints(db, context, names))
        .await
}

pub async fn add_waypoint(
    store: &impl CommuteStore,
    context: RouteContext,
    name: &str,
) -> Result<Vec<Waypoint>> {
    store
        .update(|db| {
            let mut names = waypoint_names(db, context);
            names.push(name.to_string());
            apply_waypoints(db, context, &names)
        })
        .await
}

pub async fn remove_waypoint(
    store: &impl CommuteStore,
    context: RouteContext,
    name: &str,
) -> Result<Vec<Waypoint>> {
    store
        .update(|db| {
            let mut names = waypoint_names(db, context);
            let index = names
                .iter()
                .position(|v| v == name.trim())
                .ok_or_else(|| RouteEditError::UnknownWaypoint(name.to_string()))?;
            names.remove(index);
            apply_waypoints(db, context, &names)
        })
        .await
}

/// Restores the default waypoints.
pub async fn reset_waypoints(
    store: &impl CommuteStore,
    context: RouteContext,
) -> Result<Vec<Waypoint>> {
    let names = DEFAULT_PLACES.map(String::from);
    set_waypoints(store, context, &names).await
}

/// Drops every route, session and arrival and recreates the default route.
pub async fn clear_all(store: &impl CommuteStore) -> Result<RouteContext> {
    store
        .update(|db| {
            *db = Database::default();
            Ok(ensure_default_route_in(db))
        })
        .await
}

/// Finds a waypoint by name or by its 1-based position.
pub fn resolve_waypoint<'a>(waypoints: &'a [Waypoint], query: &str) -> Option<&'a Waypoint> {
    let query = query.trim();
    waypoints.iter().find(|v| v.name == query).or_else(|| {
        query
            .parse::<usize>()
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| waypoints.get(index))
    })
}

fn waypoint_names(db: &Database, context: RouteContext) -> Vec<String> {
    db.waypoints(context.route_id)
        .into_iter()
        .map(|v| v.name)
        .collect()
}

fn apply_waypoints(
    db: &mut Database,
    context: RouteContext,
    names: &[String],
) -> Result<Vec<Waypoint>> {
    if db.route(context.route_id).is_none() {
        return Err(RouteEditError::UnknownRoute(context.route_id).into());
    }
    let names = names.iter().map(|v| v.trim()).collect::<Vec<_>>();
    let mut unique = HashSet::new();
    for name in &names {
        if name.is_empty() {
            return Err(RouteEditError::EmptyName.into());
        }
        if !unique.insert(*name) {
            return Err(RouteEditError::DuplicateName(name.to_string()).into());
        }
    }

    let mut previous = db.waypoints(context.route_id);
    let mut next_id = db.next_place_id();
    let mut waypoints = Vec::with_capacity(names.len());
    for (order, name) in names.into_iter().enumerate() {
        let id = match previous.iter().position(|v| v.name == name) {
            Some(index) => previous.remove(index).id,
            None => {
                let id = next_id;
                next_id += 1;
                id
            }
        };
        waypoints.push(Waypoint {
            id,
            route_id: context.route_id,
            order: order as u32,
            name: name.to_string(),
        });
    }

    debug!(
        "Route {} now has {} waypoints, {} removed",
        context.route_id,
        waypoints.len(),
        previous.len()
    );
    db.places.retain(|v| v.route_id != context.route_id);
    db.places.extend(waypoints.iter().cloned());
    Ok(waypoints)
}

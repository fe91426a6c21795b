use anyhow::Result;
use clap::Subcommand;

use crate::{
    recording::{
        route::{
            add_waypoint, remove_waypoint, rename_route, reset_waypoints, set_waypoints,
        },
        RouteContext,
    },
    storage::store::CommuteStore,
};

use super::render::Renderer;

#[derive(Subcommand, Debug)]
pub enum RouteCommand {
    #[command(about = "Show the route and its waypoints in order")]
    Show,
    #[command(about = "Replace the waypoints. Waypoints that keep their name keep their history")]
    Set {
        #[arg(required = true, help = "Waypoint names from the first to the last")]
        names: Vec<String>,
    },
    #[command(about = "Append a waypoint to the end of the route")]
    Add { name: String },
    #[command(about = "Remove a waypoint from the route")]
    Remove { name: String },
    #[command(about = "Rename the route")]
    Rename { name: String },
    #[command(about = "Restore the default waypoints")]
    Reset,
}

pub async fn process_route_command(
    store: &impl CommuteStore,
    context: RouteContext,
    renderer: &Renderer,
    command: RouteCommand,
) -> Result<()> {
    match command {
        RouteCommand::Show => {}
        RouteCommand::Set { names } => {
            set_waypoints(store, context, &names).await?;
        }
        RouteCommand::Add { name } => {
            add_waypoint(store, context, &name).await?;
        }
        RouteCommand::Remove { name } => {
            remove_waypoint(store, context, &name).await?;
        }
        RouteCommand::Rename { name } => {
            rename_route(store, context, &name).await?;
        }
        RouteCommand::Reset => {
            reset_waypoints(store, context).await?;
        }
    }

    let db = store.load().await?;
    if let Some(route) = db.route(context.route_id) {
        print!("{}", renderer.route(route, &db.waypoints(context.route_id)));
    }
    Ok(())
}

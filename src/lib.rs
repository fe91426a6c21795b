//! Small cli for timing a commute. Start a session, check in at each waypoint of the route and
//! end the session. Reports then show how many minutes every segment between two waypoints
//! took, per day or averaged over 7 day periods, together with the total time per session.
//!

pub mod analysis;
pub mod cli;
pub mod export;
pub mod recording;
pub mod storage;
pub mod utils;

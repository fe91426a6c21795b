//!  Storage is organized through [store::JsonFileStore].
//!  The basic idea is:
//!   - There is an application directory with a single data file.
//!   - The file holds routes, waypoints, sessions and arrivals as one json document.
//!   - Timestamps are stored as epoch milliseconds.

pub mod entities;
pub mod store;

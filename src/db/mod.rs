//! Database module for fleetwatch.
//!
//! SQLite storage for the device roster and local preferences.

mod models;
mod roster;
mod store;

pub use models::*;
pub use roster::*;
pub use store::*;

//! Dashboard view pipeline.
//!
//! Pure transformations from fleet data snapshots to the shapes the map,
//! chart and table widgets render.

mod aggregate;
mod chart;
mod filter;
mod geo;
mod ranking;
mod severity;
mod viewport;

pub use aggregate::*;
pub use chart::*;
pub use filter::*;
pub use geo::*;
pub use ranking::*;
pub use severity::*;
pub use viewport::*;

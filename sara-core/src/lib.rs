//! Decision logic for sara: distances, safe zones, and vital thresholds.
//! Nothing in here performs I/O.

mod anomaly;
mod config;
mod geo;
mod thresholds;

pub use anomaly::*;
pub use config::*;
pub use geo::*;
pub use thresholds::*;

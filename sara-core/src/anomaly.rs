use chrono::{DateTime, Utc};

use crate::speed_kmh;

/// A single location fix
#[derive(Debug, Clone, Copy)]
pub struct Fix {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Flags a track if the speed between its last two fixes exceeds the threshold.
///
/// A heuristic stand-in for a learned model, and not used by any route.
pub fn simple_anomaly_flag(fixes: &[Fix], speed_threshold_kmh: f64) -> bool {
    let [.., previous, last] = fixes else {
        return false;
    };

    speed_kmh(
        previous.lat,
        previous.lng,
        previous.timestamp,
        last.lat,
        last.lng,
        last.timestamp,
    )
    .is_some_and(|speed| speed > speed_threshold_kmh)
}

use chrono::{DateTime, Utc};

/// Mean radius of the earth, in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Returns the great-circle distance between two coordinates in meters.
///
/// Coordinates are given in degrees and are not range checked.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let a = (delta_phi / 2.).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.).sin().powi(2);

    // Rounding can push `a` slightly outside [0, 1] for antipodal points
    let a = a.clamp(0., 1.);

    2. * EARTH_RADIUS_M * a.sqrt().atan2((1. - a).sqrt())
}

/// Returns the speed between two timestamped fixes in km/h.
///
/// Returns [None] if a timestamp is missing, or if no time has passed between them.
pub fn speed_kmh(
    lat1: f64,
    lng1: f64,
    t1: Option<DateTime<Utc>>,
    lat2: f64,
    lng2: f64,
    t2: Option<DateTime<Utc>>,
) -> Option<f64> {
    let (t1, t2) = (t1?, t2?);
    let elapsed_ms = (t2 - t1).num_milliseconds();

    if elapsed_ms <= 0 {
        return None;
    }

    let km = distance_meters(lat1, lng1, lat2, lng2) / 1000.;
    let hours = elapsed_ms as f64 / 3_600_000.;

    Some(km / hours)
}

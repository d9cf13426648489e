/// The thresholds used to decide when an alert is raised
#[derive(Debug, Clone)]
pub struct Config {
    /// Heart rate above this value is a spike, in beats per minute
    pub max_heart_rate: i32,
    /// Heart rate below this value is a drop, in beats per minute
    pub min_heart_rate: i32,
    /// Body temperature above this value is a spike, in degrees celsius
    pub max_body_temp: f64,
    /// Blood oxygen saturation below this value is a spike, in percent
    pub min_spo2: i32,
    /// The radius of a safe zone when none is given, in meters
    pub default_safe_radius_m: f64,
    /// Speed between two location fixes that is considered anomalous, in km/h
    pub anomaly_speed_kmh: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_heart_rate: 120,
            min_heart_rate: 40,
            max_body_temp: 38.0,
            min_spo2: 90,
            default_safe_radius_m: 150.0,
            // Walking faster than this is unlikely
            anomaly_speed_kmh: 12.0,
        }
    }
}

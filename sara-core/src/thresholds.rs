use serde::{Deserialize, Serialize};

use crate::{distance_meters, Config};

/// The kind of an alert raised for a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The patient left their safe zone
    GeofenceBreach,
    /// A vital sign went above a threshold, or oxygen saturation fell below one
    VitalSpike,
    /// Heart rate fell below a threshold
    VitalDrop,
    /// The patient asked for help
    Sos,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeofenceBreach => "geofence_breach",
            Self::VitalSpike => "vital_spike",
            Self::VitalDrop => "vital_drop",
            Self::Sos => "sos",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "geofence_breach" => Some(Self::GeofenceBreach),
            "vital_spike" => Some(Self::VitalSpike),
            "vital_drop" => Some(Self::VitalDrop),
            "sos" => Some(Self::Sos),
            _ => None,
        }
    }
}

/// The outcome of a check that decided an alert should be raised
#[derive(Debug, Clone, PartialEq)]
pub struct AlertVerdict {
    pub kind: AlertKind,
    pub message: String,
}

impl AlertVerdict {
    fn new(kind: AlertKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// A circular area a patient is expected to stay within
#[derive(Debug, Clone, Copy)]
pub struct SafeZone {
    pub center_lat: f64,
    pub center_lng: f64,
    /// The radius in meters
    pub radius_m: f64,
}

impl SafeZone {
    /// Checks a location against the zone, returning a breach verdict if it lies outside.
    ///
    /// Every breaching location produces a verdict, there is no hysteresis.
    pub fn check(&self, lat: f64, lng: f64) -> Option<AlertVerdict> {
        let distance = distance_meters(self.center_lat, self.center_lng, lat, lng);

        if distance <= self.radius_m {
            return None;
        }

        let excess = (distance - self.radius_m).floor() as i64;

        Some(AlertVerdict::new(
            AlertKind::GeofenceBreach,
            format!("Patient left safe zone by {} m", excess),
        ))
    }
}

/// A single reading from a wearable
#[derive(Debug, Clone, Copy)]
pub struct VitalSigns {
    pub heart_rate: i32,
    /// Body temperature in degrees celsius
    pub body_temp: f64,
    /// Blood oxygen saturation in percent
    pub spo2: i32,
}

impl Config {
    /// Evaluates a reading against the thresholds.
    ///
    /// Checks run in a fixed order and only the first violation is reported:
    /// high heart rate, low heart rate, high temperature, then low oxygen saturation.
    pub fn evaluate_vitals(&self, vitals: &VitalSigns) -> Option<AlertVerdict> {
        let VitalSigns {
            heart_rate,
            body_temp,
            spo2,
        } = *vitals;

        if heart_rate > self.max_heart_rate {
            Some(AlertVerdict::new(
                AlertKind::VitalSpike,
                format!("High heart rate detected: {} bpm", heart_rate),
            ))
        } else if heart_rate < self.min_heart_rate {
            Some(AlertVerdict::new(
                AlertKind::VitalDrop,
                format!("Low heart rate detected: {} bpm", heart_rate),
            ))
        } else if body_temp > self.max_body_temp {
            // Debug keeps the decimal point on whole values, so 39.0 stays "39.0"
            Some(AlertVerdict::new(
                AlertKind::VitalSpike,
                format!("High temperature detected: {:?}°C", body_temp),
            ))
        } else if spo2 < self.min_spo2 {
            Some(AlertVerdict::new(
                AlertKind::VitalSpike,
                format!("Low SpO₂ detected: {}%", spo2),
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use crate::EARTH_RADIUS_M;

    use super::*;

    /// Returns the latitude that lies `meters` north of the equator
    fn north_of_equator(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    fn zone() -> SafeZone {
        SafeZone {
            center_lat: 0.,
            center_lng: 0.,
            radius_m: 150.,
        }
    }

    fn vitals(heart_rate: i32, body_temp: f64, spo2: i32) -> VitalSigns {
        VitalSigns {
            heart_rate,
            body_temp,
            spo2,
        }
    }

    #[test]
    fn breach_reports_rounded_down_excess() {
        // Just past 200 m, float error must not floor the excess to 49
        let verdict = zone().check(north_of_equator(200.4), 0.).unwrap();

        assert_eq!(verdict.kind, AlertKind::GeofenceBreach);
        assert!(verdict.message.contains("50"), "{}", verdict.message);

        let verdict = zone().check(north_of_equator(260.9), 0.).unwrap();
        assert_eq!(verdict.message, "Patient left safe zone by 110 m");
    }

    #[test]
    fn inside_zone_is_quiet() {
        assert_eq!(zone().check(north_of_equator(100.), 0.), None);
        assert_eq!(zone().check(0., 0.), None);
    }

    #[test]
    fn heart_rate_takes_priority_over_temperature() {
        let verdict = Config::default()
            .evaluate_vitals(&vitals(130, 39.0, 95))
            .unwrap();

        assert_eq!(verdict.kind, AlertKind::VitalSpike);
        assert_eq!(verdict.message, "High heart rate detected: 130 bpm");
    }

    #[test]
    fn each_threshold_in_order() {
        let config = Config::default();

        let low_heart = config.evaluate_vitals(&vitals(35, 39.5, 80)).unwrap();
        assert_eq!(low_heart.kind, AlertKind::VitalDrop);
        assert_eq!(low_heart.message, "Low heart rate detected: 35 bpm");

        let fever = config.evaluate_vitals(&vitals(80, 39.0, 80)).unwrap();
        assert_eq!(fever.kind, AlertKind::VitalSpike);
        assert_eq!(fever.message, "High temperature detected: 39.0°C");

        let low_oxygen = config.evaluate_vitals(&vitals(80, 37.0, 85)).unwrap();
        assert_eq!(low_oxygen.kind, AlertKind::VitalSpike);
        assert_eq!(low_oxygen.message, "Low SpO₂ detected: 85%");
    }

    #[test]
    fn boundaries_do_not_fire() {
        let config = Config::default();

        assert_eq!(config.evaluate_vitals(&vitals(80, 37.0, 95)), None);
        assert_eq!(config.evaluate_vitals(&vitals(120, 38.0, 90)), None);
        assert_eq!(config.evaluate_vitals(&vitals(40, 38.0, 90)), None);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let kinds = [
            AlertKind::GeofenceBreach,
            AlertKind::VitalSpike,
            AlertKind::VitalDrop,
            AlertKind::Sos,
        ];

        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(AlertKind::parse(kind.as_str()), Some(kind));
        }
    }
}

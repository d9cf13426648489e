use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sara_core::{AlertVerdict, SafeZone, VitalSigns};

use crate::{
    util::lookback, AlertData, Alerts, CareConfig, CareContext, LocationData, NewLocation, NewVital,
    PrimaryKey, Result, SharedDatabase, VitalData,
};

/// Stores location pings and wearable readings, raising alerts when they cross a threshold.
///
/// The primary write and the alert write are independent. A failure while evaluating or
/// raising an alert is logged and never fails the write that triggered it.
pub struct Tracking {
    db: SharedDatabase,
    config: Arc<CareConfig>,
    alerts: Alerts,
}

impl Tracking {
    pub const DEFAULT_HISTORY_HOURS: i64 = 24;

    pub fn new(context: &CareContext) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
            alerts: Alerts::new(context),
        }
    }

    /// Stores a location ping, then checks it against the patient's safe zone
    pub async fn record_ping(&self, ping: NewPing) -> Result<Tracked<LocationData>> {
        let location = self
            .db
            .create_location(NewLocation {
                patient_id: ping.patient_id,
                lat: ping.lat,
                lng: ping.lng,
                timestamp: ping.timestamp.unwrap_or_else(Utc::now),
            })
            .await?;

        let verdict = match self.db.patient_by_id(ping.patient_id).await {
            Ok(patient) => SafeZone {
                center_lat: patient.safe_center_lat,
                center_lng: patient.safe_center_lng,
                radius_m: patient.safe_radius_m,
            }
            .check(location.lat, location.lng),
            Err(e) => {
                log::warn!(
                    "Skipping geofence check for patient {}: {}",
                    ping.patient_id,
                    e
                );
                None
            }
        };

        let alert = self.raise_quietly(ping.patient_id, verdict).await;

        Ok(Tracked {
            record: location,
            alert,
        })
    }

    pub async fn latest_location(&self, patient_id: PrimaryKey) -> Result<LocationData> {
        self.db.latest_location(patient_id).await
    }

    /// Stores a reading from a wearable, stamped with the time it was received
    pub async fn record_vitals(&self, reading: NewReading) -> Result<Tracked<VitalData>> {
        let vital = self
            .db
            .create_vital(NewVital {
                patient_id: reading.patient_id,
                heart_rate: reading.heart_rate,
                body_temp: reading.body_temp,
                spo2: reading.spo2,
                timestamp: Utc::now(),
            })
            .await?;

        let verdict = self.config.thresholds.evaluate_vitals(&VitalSigns {
            heart_rate: vital.heart_rate,
            body_temp: vital.body_temp,
            spo2: vital.spo2,
        });

        let alert = self.raise_quietly(vital.patient_id, verdict).await;

        Ok(Tracked {
            record: vital,
            alert,
        })
    }

    pub async fn latest_vitals(&self, patient_id: PrimaryKey) -> Result<VitalData> {
        self.db.latest_vital(patient_id).await
    }

    /// Readings from the last `hours`, newest first
    pub async fn vitals_history(
        &self,
        patient_id: PrimaryKey,
        hours: Option<i64>,
    ) -> Result<Vec<VitalData>> {
        let hours = hours.unwrap_or(Self::DEFAULT_HISTORY_HOURS);
        let since = lookback(hours, Duration::try_hours);

        self.db.vitals_since(patient_id, since).await
    }

    async fn raise_quietly(
        &self,
        patient_id: PrimaryKey,
        verdict: Option<AlertVerdict>,
    ) -> Option<AlertData> {
        let verdict = verdict?;

        match self.alerts.raise(patient_id, verdict).await {
            Ok(alert) => Some(alert),
            Err(e) => {
                log::warn!("Failed to raise alert for patient {}: {}", patient_id, e);
                None
            }
        }
    }
}

#[derive(Debug)]
pub struct NewPing {
    pub patient_id: PrimaryKey,
    pub lat: f64,
    pub lng: f64,
    /// Defaults to the time the ping was received
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewReading {
    pub patient_id: PrimaryKey,
    pub heart_rate: i32,
    pub body_temp: f64,
    pub spo2: i32,
}

/// A stored record and the alert it raised, if any
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    pub record: T,
    pub alert: Option<AlertData>,
}

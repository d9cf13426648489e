use chrono::Utc;
use sara_core::{AlertKind, AlertVerdict};

use crate::{AlertData, CareContext, NewAlert, PrimaryKey, Result, SharedDatabase};

/// Records alerts raised for patients. Alerts are never updated or deleted.
pub struct Alerts {
    db: SharedDatabase,
}

impl Alerts {
    pub const SOS_MESSAGE: &'static str = "Patient pressed SOS";

    pub fn new(context: &CareContext) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    /// Stores an alert for a verdict produced by the threshold evaluator
    pub async fn raise(&self, patient_id: PrimaryKey, verdict: AlertVerdict) -> Result<AlertData> {
        let alert = self
            .db
            .create_alert(NewAlert {
                patient_id,
                kind: verdict.kind,
                message: verdict.message,
                created_at: Utc::now(),
            })
            .await?;

        log::info!(
            "Raised {} alert for patient {}: {}",
            alert.kind.as_str(),
            patient_id,
            alert.message
        );

        Ok(alert)
    }

    /// Raises an alert on behalf of a patient pressing the panic button
    pub async fn sos(&self, patient_id: PrimaryKey) -> Result<AlertData> {
        self.raise(
            patient_id,
            AlertVerdict {
                kind: AlertKind::Sos,
                message: Self::SOS_MESSAGE.to_string(),
            },
        )
        .await
    }

    /// All alerts of a patient, newest first
    pub async fn list(&self, patient_id: PrimaryKey) -> Result<Vec<AlertData>> {
        self.db.alerts_by_patient(patient_id).await
    }
}

#[cfg(test)]
mod test {
    use sara_core::{AlertKind, AlertVerdict};
    use uuid::Uuid;

    use crate::test_util::care;

    #[tokio::test]
    async fn sos_is_listed_newest_first() {
        let care = care();
        let patient_id = Uuid::new_v4();

        care.alerts
            .raise(
                patient_id,
                AlertVerdict {
                    kind: AlertKind::VitalDrop,
                    message: "Low heart rate detected: 35 bpm".to_string(),
                },
            )
            .await
            .unwrap();

        let sos = care.alerts.sos(patient_id).await.unwrap();

        assert_eq!(sos.kind, AlertKind::Sos);
        assert_eq!(sos.message, "Patient pressed SOS");
        assert!(!sos.resolved);

        let alerts = care.alerts.list(patient_id).await.unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].id, sos.id);
        assert_eq!(alerts[1].kind, AlertKind::VitalDrop);
    }

    #[tokio::test]
    async fn alerts_are_scoped_to_patient() {
        let care = care();
        care.alerts.sos(Uuid::new_v4()).await.unwrap();

        assert!(care.alerts.list(Uuid::new_v4()).await.unwrap().is_empty());
    }
}

use std::sync::Arc;

use chrono::Utc;

use crate::{
    CareConfig, CareContext, DatabaseError, NewPatient, NewReminder, PatientData, PrimaryKey,
    ReminderData, Result, Role, SharedDatabase,
};

/// Manages patients and the reminders scheduled for them
pub struct Patients {
    db: SharedDatabase,
    config: Arc<CareConfig>,
}

impl Patients {
    pub fn new(context: &CareContext) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
        }
    }

    /// Creates a patient owned by a caretaker
    pub async fn create_patient(&self, new_patient: NewPlainPatient) -> Result<PatientData> {
        let caretaker = self.db.user_by_id(new_patient.caretaker_id).await?;

        if caretaker.role != Role::Caretaker {
            return Err(DatabaseError::not_found("caretaker", "id"));
        }

        let safe_radius_m = new_patient
            .safe_radius_m
            .unwrap_or(self.config.thresholds.default_safe_radius_m);

        let patient = self
            .db
            .create_patient(NewPatient {
                name: new_patient.name,
                caretaker_id: caretaker.id,
                safe_center_lat: new_patient.safe_center_lat,
                safe_center_lng: new_patient.safe_center_lng,
                safe_radius_m,
            })
            .await?;

        log::info!("Created patient {} for caretaker {}", patient.id, caretaker.id);

        Ok(patient)
    }

    pub async fn list_patients(&self, caretaker_id: PrimaryKey) -> Result<Vec<PatientData>> {
        self.db.patients_by_caretaker(caretaker_id).await
    }

    /// Schedules a reminder for a patient the caretaker owns
    pub async fn create_reminder(
        &self,
        caretaker_id: PrimaryKey,
        new_reminder: NewReminder,
    ) -> Result<ReminderData> {
        let patient = self.db.patient_by_id(new_reminder.patient_id).await?;

        // Someone else's patient looks the same as a missing one
        if patient.caretaker_id != caretaker_id {
            return Err(DatabaseError::not_found("patient", "id"));
        }

        self.db.create_reminder(new_reminder).await
    }

    /// Unacknowledged reminders that are due, earliest first
    pub async fn due_reminders(&self, patient_id: PrimaryKey) -> Result<Vec<ReminderData>> {
        self.db.due_reminders(patient_id, Utc::now()).await
    }

    /// Marks a reminder as acknowledged. Acknowledging twice is not an error.
    pub async fn acknowledge_reminder(&self, reminder_id: PrimaryKey) -> Result<()> {
        self.db.acknowledge_reminder(reminder_id).await
    }
}

#[derive(Debug)]
pub struct NewPlainPatient {
    pub name: String,
    pub caretaker_id: PrimaryKey,
    pub safe_center_lat: f64,
    pub safe_center_lng: f64,
    /// Defaults to the configured safe radius
    pub safe_radius_m: Option<f64>,
}

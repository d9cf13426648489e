use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type SharedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

impl DatabaseError {
    pub fn not_found(resource: &'static str, identifier: &'static str) -> Self {
        Self::NotFound {
            resource,
            identifier,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can store and fetch sara records.
///
/// Every method is a single atomic call against the backend.
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_email(&self, email: &str) -> Result<UserData>;
    /// Fails with a conflict if the email is taken
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn patient_by_id(&self, patient_id: PrimaryKey) -> Result<PatientData>;
    async fn create_patient(&self, new_patient: NewPatient) -> Result<PatientData>;
    async fn patients_by_caretaker(&self, caretaker_id: PrimaryKey) -> Result<Vec<PatientData>>;

    async fn create_location(&self, new_location: NewLocation) -> Result<LocationData>;
    async fn latest_location(&self, patient_id: PrimaryKey) -> Result<LocationData>;

    async fn create_vital(&self, new_vital: NewVital) -> Result<VitalData>;
    async fn latest_vital(&self, patient_id: PrimaryKey) -> Result<VitalData>;
    /// Readings taken at or after `since`, newest first
    async fn vitals_since(
        &self,
        patient_id: PrimaryKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<VitalData>>;

    async fn create_alert(&self, new_alert: NewAlert) -> Result<AlertData>;
    /// All alerts of a patient, newest first
    async fn alerts_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<AlertData>>;

    async fn create_reminder(&self, new_reminder: NewReminder) -> Result<ReminderData>;
    /// Unacknowledged reminders due at or before `now`
    async fn due_reminders(
        &self,
        patient_id: PrimaryKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderData>>;
    async fn acknowledge_reminder(&self, reminder_id: PrimaryKey) -> Result<()>;

    /// Fails with a conflict if the token is taken
    async fn create_device(&self, new_device: NewDevice) -> Result<DeviceData>;
    async fn device_by_token(&self, token: &str) -> Result<DeviceData>;
    async fn devices_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DeviceData>>;

    async fn create_mood(&self, new_mood: NewMood) -> Result<MoodData>;
    /// Moods logged at or after `since`, oldest first
    async fn moods_since(&self, patient_id: PrimaryKey, since: DateTime<Utc>)
        -> Result<Vec<MoodData>>;

    async fn create_comfort_message(
        &self,
        new_message: NewComfortMessage,
    ) -> Result<ComfortMessageData>;
    async fn latest_comfort_message(&self, patient_id: PrimaryKey) -> Result<ComfortMessageData>;

    async fn create_family_message(
        &self,
        new_message: NewFamilyMessage,
    ) -> Result<FamilyMessageData>;
    async fn latest_family_message(&self, patient_id: PrimaryKey) -> Result<FamilyMessageData>;

    async fn create_family_image(&self, new_image: NewFamilyImage) -> Result<FamilyImageData>;
    /// Newest first
    async fn family_images_by_patient(&self, patient_id: PrimaryKey)
        -> Result<Vec<FamilyImageData>>;

    async fn create_daily_log(&self, new_log: NewDailyLog) -> Result<DailyLogData>;
    /// Newest first
    async fn daily_logs_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DailyLogData>>;
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    /// Must already be hashed
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug)]
pub struct NewPatient {
    pub name: String,
    pub caretaker_id: PrimaryKey,
    pub safe_center_lat: f64,
    pub safe_center_lng: f64,
    pub safe_radius_m: f64,
}

#[derive(Debug)]
pub struct NewLocation {
    pub patient_id: PrimaryKey,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewVital {
    pub patient_id: PrimaryKey,
    pub heart_rate: i32,
    pub body_temp: f64,
    pub spo2: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewAlert {
    pub patient_id: PrimaryKey,
    pub kind: AlertKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewReminder {
    pub patient_id: PrimaryKey,
    pub title: String,
    pub when: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct NewDevice {
    pub patient_id: PrimaryKey,
    pub device_name: String,
    pub device_token: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewMood {
    pub patient_id: PrimaryKey,
    pub mood: Mood,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewComfortMessage {
    pub patient_id: PrimaryKey,
    pub message: String,
    pub created_by: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewFamilyMessage {
    pub patient_id: PrimaryKey,
    pub from_user: PrimaryKey,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewFamilyImage {
    pub patient_id: PrimaryKey,
    pub uploaded_by: PrimaryKey,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewDailyLog {
    pub patient_id: PrimaryKey,
    pub caretaker_id: PrimaryKey,
    pub entry: String,
    pub timestamp: DateTime<Utc>,
}

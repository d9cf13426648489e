use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub use sara_core::AlertKind;

/// The type used for primary keys in the database.
pub type PrimaryKey = Uuid;

/// What a user is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Caretaker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Caretaker => "caretaker",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "patient" => Some(Self::Patient),
            "caretaker" => Some(Self::Caretaker),
            _ => None,
        }
    }
}

/// How a patient reports feeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Good,
    Okay,
    Low,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "good" => Some(Self::Good),
            "okay" => Some(Self::Okay),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A sara account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub email: String,
    /// The argon2 hash of the password
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// A person being cared for
#[derive(Debug, Clone, FromRow)]
pub struct PatientData {
    pub id: PrimaryKey,
    pub name: String,
    /// The caretaker that created and owns this patient
    pub caretaker_id: PrimaryKey,
    pub safe_center_lat: f64,
    pub safe_center_lng: f64,
    pub safe_radius_m: f64,
}

/// A location ping for a patient
#[derive(Debug, Clone, FromRow)]
pub struct LocationData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

/// A reading submitted by a wearable device
#[derive(Debug, Clone, FromRow)]
pub struct VitalData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub heart_rate: i32,
    pub body_temp: f64,
    pub spo2: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AlertData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub kind: AlertKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Nothing sets this yet
    pub resolved: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReminderData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub title: String,
    /// When the reminder is due
    #[sqlx(rename = "due_at")]
    pub when: DateTime<Utc>,
    pub notes: Option<String>,
    pub acknowledged: bool,
}

/// A wearable registered to a patient
#[derive(Debug, Clone, FromRow)]
pub struct DeviceData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub device_name: String,
    /// The secret the device authenticates with, unique across all devices
    pub device_token: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MoodData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub mood: Mood,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A message a caretaker leaves to comfort a patient
#[derive(Debug, Clone, FromRow)]
pub struct ComfortMessageData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub message: String,
    pub created_by: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FamilyImageData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub uploaded_by: PrimaryKey,
    /// Where the uploaded file is served from
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FamilyMessageData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub from_user: PrimaryKey,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// An observation a caretaker writes down about a patient
#[derive(Debug, Clone, FromRow)]
pub struct DailyLogData {
    pub id: PrimaryKey,
    pub patient_id: PrimaryKey,
    pub caretaker_id: PrimaryKey,
    pub entry: String,
    pub timestamp: DateTime<Utc>,
}

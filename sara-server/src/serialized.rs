//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use chrono::{DateTime, Utc};
use sara_care::{
    AlertData, ComfortMessageData, DailyLogData, DeviceData, FamilyImageData, FamilyMessageData,
    LocationData, LoginData, MoodData, PatientData, PrimaryKey, ReminderData, UserData, VitalData,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    id: PrimaryKey,
    email: String,
    name: String,
    role: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    access_token: String,
    token_type: &'static str,
    role: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Patient {
    id: PrimaryKey,
    name: String,
    caretaker_id: PrimaryKey,
    safe_center_lat: f64,
    safe_center_lng: f64,
    safe_radius_m: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Location {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    lat: f64,
    lng: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Alert {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    #[serde(rename = "type")]
    #[schema(example = "geofence_breach")]
    kind: &'static str,
    message: String,
    created_at: DateTime<Utc>,
    resolved: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Vital {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    heart_rate: i32,
    body_temp: f64,
    spo2: i32,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Reminder {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    title: String,
    when: DateTime<Utc>,
    notes: Option<String>,
    acknowledged: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Device {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    device_name: String,
    device_token: String,
    registered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Mood {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    #[schema(example = "okay")]
    mood: &'static str,
    note: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComfortMessage {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    message: String,
    created_by: PrimaryKey,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FamilyImage {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    uploaded_by: PrimaryKey,
    image_url: String,
    caption: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FamilyMessage {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    from_user: PrimaryKey,
    message: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyLog {
    id: PrimaryKey,
    patient_id: PrimaryKey,
    caretaker_id: PrimaryKey,
    entry: String,
    timestamp: DateTime<Utc>,
}

/// Returned by endpoints that only perform a side effect
#[derive(Debug, Serialize, ToSchema)]
pub struct Confirmation {
    ok: bool,
}

impl Confirmation {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    status: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.as_str(),
        }
    }
}

impl ToSerialized<LoginResult> for LoginData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            access_token: self.access_token.clone(),
            token_type: self.token_type,
            role: self.role.as_str(),
        }
    }
}

impl ToSerialized<Patient> for PatientData {
    fn to_serialized(&self) -> Patient {
        Patient {
            id: self.id,
            name: self.name.clone(),
            caretaker_id: self.caretaker_id,
            safe_center_lat: self.safe_center_lat,
            safe_center_lng: self.safe_center_lng,
            safe_radius_m: self.safe_radius_m,
        }
    }
}

impl ToSerialized<Location> for LocationData {
    fn to_serialized(&self) -> Location {
        Location {
            id: self.id,
            patient_id: self.patient_id,
            lat: self.lat,
            lng: self.lng,
            timestamp: self.timestamp,
        }
    }
}

impl ToSerialized<Alert> for AlertData {
    fn to_serialized(&self) -> Alert {
        Alert {
            id: self.id,
            patient_id: self.patient_id,
            kind: self.kind.as_str(),
            message: self.message.clone(),
            created_at: self.created_at,
            resolved: self.resolved,
        }
    }
}

impl ToSerialized<Vital> for VitalData {
    fn to_serialized(&self) -> Vital {
        Vital {
            id: self.id,
            patient_id: self.patient_id,
            heart_rate: self.heart_rate,
            body_temp: self.body_temp,
            spo2: self.spo2,
            timestamp: self.timestamp,
        }
    }
}

impl ToSerialized<Reminder> for ReminderData {
    fn to_serialized(&self) -> Reminder {
        Reminder {
            id: self.id,
            patient_id: self.patient_id,
            title: self.title.clone(),
            when: self.when,
            notes: self.notes.clone(),
            acknowledged: self.acknowledged,
        }
    }
}

impl ToSerialized<Device> for DeviceData {
    fn to_serialized(&self) -> Device {
        Device {
            id: self.id,
            patient_id: self.patient_id,
            device_name: self.device_name.clone(),
            device_token: self.device_token.clone(),
            registered_at: self.registered_at,
        }
    }
}

impl ToSerialized<Mood> for MoodData {
    fn to_serialized(&self) -> Mood {
        Mood {
            id: self.id,
            patient_id: self.patient_id,
            mood: self.mood.as_str(),
            note: self.note.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl ToSerialized<ComfortMessage> for ComfortMessageData {
    fn to_serialized(&self) -> ComfortMessage {
        ComfortMessage {
            id: self.id,
            patient_id: self.patient_id,
            message: self.message.clone(),
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<FamilyImage> for FamilyImageData {
    fn to_serialized(&self) -> FamilyImage {
        FamilyImage {
            id: self.id,
            patient_id: self.patient_id,
            uploaded_by: self.uploaded_by,
            image_url: self.image_url.clone(),
            caption: self.caption.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<FamilyMessage> for FamilyMessageData {
    fn to_serialized(&self) -> FamilyMessage {
        FamilyMessage {
            id: self.id,
            patient_id: self.patient_id,
            from_user: self.from_user,
            message: self.message.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<DailyLog> for DailyLogData {
    fn to_serialized(&self) -> DailyLog {
        DailyLog {
            id: self.id,
            patient_id: self.patient_id,
            caretaker_id: self.caretaker_id,
            entry: self.entry.clone(),
            timestamp: self.timestamp,
        }
    }
}

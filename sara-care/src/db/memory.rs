use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    AlertData, ComfortMessageData, DailyLogData, Database, DatabaseError, DeviceData,
    FamilyImageData, FamilyMessageData, LocationData, MoodData, NewAlert, NewComfortMessage,
    NewDailyLog, NewDevice, NewFamilyImage, NewFamilyMessage, NewLocation, NewMood, NewPatient,
    NewReminder, NewUser, NewVital, PatientData, PrimaryKey, ReminderData, Result, UserData,
    VitalData,
};

// Keyed records that are looked up or updated by id
type Table<T> = DashMap<PrimaryKey, T>;

/// An append-only collection, kept in insertion order
struct Log<T>(RwLock<Vec<T>>);

impl<T: Clone> Log<T> {
    fn push(&self, record: T) -> T {
        self.0.write().push(record.clone());
        record
    }

    /// Returns matching records, newest inserted first
    fn newest_first(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.0
            .read()
            .iter()
            .rev()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Returns the matching record with the greatest key, preferring the last inserted on ties
    fn latest_by<K: Ord>(&self, predicate: impl Fn(&T) -> bool, key: impl Fn(&T) -> K) -> Option<T> {
        self.0
            .read()
            .iter()
            .filter(|r| predicate(r))
            .max_by_key(|r| key(r))
            .cloned()
    }
}

impl<T> Default for Log<T> {
    fn default() -> Self {
        Self(RwLock::new(Vec::new()))
    }
}

/// An in-process database, used for development and tests.
///
/// Nothing is persisted once the process exits.
#[derive(Default)]
pub struct MemoryDatabase {
    users: Table<UserData>,
    /// Maps emails to user ids, enforcing uniqueness
    emails: DashMap<String, PrimaryKey>,
    patients: Table<PatientData>,
    reminders: Table<ReminderData>,
    devices: Table<DeviceData>,
    /// Maps device tokens to device ids, enforcing uniqueness
    device_tokens: DashMap<String, PrimaryKey>,

    locations: Log<LocationData>,
    vitals: Log<VitalData>,
    alerts: Log<AlertData>,
    moods: Log<MoodData>,
    comfort_messages: Log<ComfortMessageData>,
    family_messages: Log<FamilyMessageData>,
    family_images: Log<FamilyImageData>,
    daily_logs: Log<DailyLogData>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sorts newest first, keeping the existing order on ties
fn sort_newest<T, K: Ord>(records: &mut [T], key: impl Fn(&T) -> K) {
    records.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.users
            .get(&user_id)
            .map(|u| u.clone())
            .ok_or(DatabaseError::not_found("user", "id"))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        let user_id = self
            .emails
            .get(email)
            .map(|id| *id)
            .ok_or(DatabaseError::not_found("user", "email"))?;

        self.user_by_id(user_id).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        match self.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Conflict {
                resource: "user",
                field: "email",
                value: new_user.email,
            }),
            Entry::Vacant(entry) => {
                let user = UserData {
                    id: Uuid::new_v4(),
                    email: new_user.email,
                    password: new_user.password,
                    name: new_user.name,
                    role: new_user.role,
                };

                self.users.insert(user.id, user.clone());
                entry.insert(user.id);

                Ok(user)
            }
        }
    }

    async fn patient_by_id(&self, patient_id: PrimaryKey) -> Result<PatientData> {
        self.patients
            .get(&patient_id)
            .map(|p| p.clone())
            .ok_or(DatabaseError::not_found("patient", "id"))
    }

    async fn create_patient(&self, new_patient: NewPatient) -> Result<PatientData> {
        let patient = PatientData {
            id: Uuid::new_v4(),
            name: new_patient.name,
            caretaker_id: new_patient.caretaker_id,
            safe_center_lat: new_patient.safe_center_lat,
            safe_center_lng: new_patient.safe_center_lng,
            safe_radius_m: new_patient.safe_radius_m,
        };

        self.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn patients_by_caretaker(&self, caretaker_id: PrimaryKey) -> Result<Vec<PatientData>> {
        let mut patients: Vec<_> = self
            .patients
            .iter()
            .filter(|p| p.caretaker_id == caretaker_id)
            .map(|p| p.clone())
            .collect();

        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }

    async fn create_location(&self, new_location: NewLocation) -> Result<LocationData> {
        Ok(self.locations.push(LocationData {
            id: Uuid::new_v4(),
            patient_id: new_location.patient_id,
            lat: new_location.lat,
            lng: new_location.lng,
            timestamp: new_location.timestamp,
        }))
    }

    async fn latest_location(&self, patient_id: PrimaryKey) -> Result<LocationData> {
        self.locations
            .latest_by(|l| l.patient_id == patient_id, |l| l.timestamp)
            .ok_or(DatabaseError::not_found("location", "patient_id"))
    }

    async fn create_vital(&self, new_vital: NewVital) -> Result<VitalData> {
        Ok(self.vitals.push(VitalData {
            id: Uuid::new_v4(),
            patient_id: new_vital.patient_id,
            heart_rate: new_vital.heart_rate,
            body_temp: new_vital.body_temp,
            spo2: new_vital.spo2,
            timestamp: new_vital.timestamp,
        }))
    }

    async fn latest_vital(&self, patient_id: PrimaryKey) -> Result<VitalData> {
        self.vitals
            .latest_by(|v| v.patient_id == patient_id, |v| v.timestamp)
            .ok_or(DatabaseError::not_found("vital", "patient_id"))
    }

    async fn vitals_since(
        &self,
        patient_id: PrimaryKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<VitalData>> {
        let mut vitals = self
            .vitals
            .newest_first(|v| v.patient_id == patient_id && v.timestamp >= since);

        sort_newest(&mut vitals, |v| v.timestamp);
        Ok(vitals)
    }

    async fn create_alert(&self, new_alert: NewAlert) -> Result<AlertData> {
        Ok(self.alerts.push(AlertData {
            id: Uuid::new_v4(),
            patient_id: new_alert.patient_id,
            kind: new_alert.kind,
            message: new_alert.message,
            created_at: new_alert.created_at,
            resolved: false,
        }))
    }

    async fn alerts_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<AlertData>> {
        let mut alerts = self.alerts.newest_first(|a| a.patient_id == patient_id);

        sort_newest(&mut alerts, |a| a.created_at);
        Ok(alerts)
    }

    async fn create_reminder(&self, new_reminder: NewReminder) -> Result<ReminderData> {
        let reminder = ReminderData {
            id: Uuid::new_v4(),
            patient_id: new_reminder.patient_id,
            title: new_reminder.title,
            when: new_reminder.when,
            notes: new_reminder.notes,
            acknowledged: false,
        };

        self.reminders.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn due_reminders(
        &self,
        patient_id: PrimaryKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderData>> {
        let mut reminders: Vec<_> = self
            .reminders
            .iter()
            .filter(|r| r.patient_id == patient_id && !r.acknowledged && r.when <= now)
            .map(|r| r.clone())
            .collect();

        reminders.sort_by_key(|r| r.when);
        Ok(reminders)
    }

    async fn acknowledge_reminder(&self, reminder_id: PrimaryKey) -> Result<()> {
        let mut reminder = self
            .reminders
            .get_mut(&reminder_id)
            .ok_or(DatabaseError::not_found("reminder", "id"))?;

        reminder.acknowledged = true;
        Ok(())
    }

    async fn create_device(&self, new_device: NewDevice) -> Result<DeviceData> {
        match self.device_tokens.entry(new_device.device_token.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Conflict {
                resource: "device",
                field: "device_token",
                value: new_device.device_token,
            }),
            Entry::Vacant(entry) => {
                let device = DeviceData {
                    id: Uuid::new_v4(),
                    patient_id: new_device.patient_id,
                    device_name: new_device.device_name,
                    device_token: new_device.device_token,
                    registered_at: new_device.registered_at,
                };

                self.devices.insert(device.id, device.clone());
                entry.insert(device.id);

                Ok(device)
            }
        }
    }

    async fn device_by_token(&self, token: &str) -> Result<DeviceData> {
        let device_id = self
            .device_tokens
            .get(token)
            .map(|id| *id)
            .ok_or(DatabaseError::not_found("device", "device_token"))?;

        self.devices
            .get(&device_id)
            .map(|d| d.clone())
            .ok_or(DatabaseError::not_found("device", "id"))
    }

    async fn devices_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DeviceData>> {
        let mut devices: Vec<_> = self
            .devices
            .iter()
            .filter(|d| d.patient_id == patient_id)
            .map(|d| d.clone())
            .collect();

        devices.sort_by_key(|d| d.registered_at);
        Ok(devices)
    }

    async fn create_mood(&self, new_mood: NewMood) -> Result<MoodData> {
        Ok(self.moods.push(MoodData {
            id: Uuid::new_v4(),
            patient_id: new_mood.patient_id,
            mood: new_mood.mood,
            note: new_mood.note,
            timestamp: new_mood.timestamp,
        }))
    }

    async fn moods_since(
        &self,
        patient_id: PrimaryKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodData>> {
        let mut moods = self
            .moods
            .newest_first(|m| m.patient_id == patient_id && m.timestamp >= since);

        moods.reverse();
        moods.sort_by_key(|m| m.timestamp);
        Ok(moods)
    }

    async fn create_comfort_message(
        &self,
        new_message: NewComfortMessage,
    ) -> Result<ComfortMessageData> {
        Ok(self.comfort_messages.push(ComfortMessageData {
            id: Uuid::new_v4(),
            patient_id: new_message.patient_id,
            message: new_message.message,
            created_by: new_message.created_by,
            created_at: new_message.created_at,
        }))
    }

    async fn latest_comfort_message(&self, patient_id: PrimaryKey) -> Result<ComfortMessageData> {
        self.comfort_messages
            .latest_by(|m| m.patient_id == patient_id, |m| m.created_at)
            .ok_or(DatabaseError::not_found("comfort message", "patient_id"))
    }

    async fn create_family_message(
        &self,
        new_message: NewFamilyMessage,
    ) -> Result<FamilyMessageData> {
        Ok(self.family_messages.push(FamilyMessageData {
            id: Uuid::new_v4(),
            patient_id: new_message.patient_id,
            from_user: new_message.from_user,
            message: new_message.message,
            created_at: new_message.created_at,
        }))
    }

    async fn latest_family_message(&self, patient_id: PrimaryKey) -> Result<FamilyMessageData> {
        self.family_messages
            .latest_by(|m| m.patient_id == patient_id, |m| m.created_at)
            .ok_or(DatabaseError::not_found("family message", "patient_id"))
    }

    async fn create_family_image(&self, new_image: NewFamilyImage) -> Result<FamilyImageData> {
        Ok(self.family_images.push(FamilyImageData {
            id: Uuid::new_v4(),
            patient_id: new_image.patient_id,
            uploaded_by: new_image.uploaded_by,
            image_url: new_image.image_url,
            caption: new_image.caption,
            created_at: new_image.created_at,
        }))
    }

    async fn family_images_by_patient(
        &self,
        patient_id: PrimaryKey,
    ) -> Result<Vec<FamilyImageData>> {
        let mut images = self.family_images.newest_first(|i| i.patient_id == patient_id);

        sort_newest(&mut images, |i| i.created_at);
        Ok(images)
    }

    async fn create_daily_log(&self, new_log: NewDailyLog) -> Result<DailyLogData> {
        Ok(self.daily_logs.push(DailyLogData {
            id: Uuid::new_v4(),
            patient_id: new_log.patient_id,
            caretaker_id: new_log.caretaker_id,
            entry: new_log.entry,
            timestamp: new_log.timestamp,
        }))
    }

    async fn daily_logs_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DailyLogData>> {
        let mut logs = self.daily_logs.newest_first(|l| l.patient_id == patient_id);

        sort_newest(&mut logs, |l| l.timestamp);
        Ok(logs)
    }
}

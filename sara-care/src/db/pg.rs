use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, query, query_as, Error as SqlxError, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    AlertData, AlertKind, ComfortMessageData, DailyLogData, Database, DatabaseError,
    DatabaseResult, DeviceData, FamilyImageData, FamilyMessageData, IntoDatabaseError,
    LocationData, Mood, MoodData, NewAlert, NewComfortMessage, NewDailyLog, NewDevice,
    NewFamilyImage, NewFamilyMessage, NewLocation, NewMood, NewPatient, NewReminder, NewUser,
    NewVital, PatientData, PrimaryKey, ReminderData, Result, Role, UserData, VitalData,
};

/// A postgres database implementation for sara
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self { pool })
    }

    /// Applies any pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password: String,
    name: String,
    role: String,
}

impl TryFrom<UserRow> for UserData {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::parse(&row.role).ok_or_else(|| invalid_column("users.role", &row.role))?;

        Ok(UserData {
            id: row.id,
            email: row.email,
            password: row.password,
            name: row.name,
            role,
        })
    }
}

#[derive(FromRow)]
struct AlertRow {
    id: Uuid,
    patient_id: Uuid,
    kind: String,
    message: String,
    created_at: DateTime<Utc>,
    resolved: bool,
}

impl TryFrom<AlertRow> for AlertData {
    type Error = DatabaseError;

    fn try_from(row: AlertRow) -> Result<Self> {
        let kind =
            AlertKind::parse(&row.kind).ok_or_else(|| invalid_column("alerts.kind", &row.kind))?;

        Ok(AlertData {
            id: row.id,
            patient_id: row.patient_id,
            kind,
            message: row.message,
            created_at: row.created_at,
            resolved: row.resolved,
        })
    }
}

#[derive(FromRow)]
struct MoodRow {
    id: Uuid,
    patient_id: Uuid,
    mood: String,
    note: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<MoodRow> for MoodData {
    type Error = DatabaseError;

    fn try_from(row: MoodRow) -> Result<Self> {
        let mood = Mood::parse(&row.mood).ok_or_else(|| invalid_column("moods.mood", &row.mood))?;

        Ok(MoodData {
            id: row.id,
            patient_id: row.patient_id,
            mood,
            note: row.note,
            timestamp: row.timestamp,
        })
    }
}

fn invalid_column(column: &str, value: &str) -> DatabaseError {
    DatabaseError::Internal(format!("Unexpected value {:?} in {}", value, column).into())
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))?
            .try_into()
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "email"))?
            .try_into()
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        query_as::<_, UserRow>(
            "INSERT INTO users (id, email, password, name, role) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.name)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        // Another registration may have won the race since the check above
        .map_err(|e| e.conflict_or("user", "email", &new_user.email))?
        .try_into()
    }

    async fn patient_by_id(&self, patient_id: PrimaryKey) -> Result<PatientData> {
        query_as("SELECT * FROM patients WHERE id = $1")
            .bind(patient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("patient", "id"))
    }

    async fn create_patient(&self, new_patient: NewPatient) -> Result<PatientData> {
        query_as(
            "INSERT INTO patients (id, name, caretaker_id, safe_center_lat, safe_center_lng, safe_radius_m)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_patient.name)
        .bind(new_patient.caretaker_id)
        .bind(new_patient.safe_center_lat)
        .bind(new_patient.safe_center_lng)
        .bind(new_patient.safe_radius_m)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn patients_by_caretaker(&self, caretaker_id: PrimaryKey) -> Result<Vec<PatientData>> {
        query_as("SELECT * FROM patients WHERE caretaker_id = $1 ORDER BY name")
            .bind(caretaker_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_location(&self, new_location: NewLocation) -> Result<LocationData> {
        query_as(
            "INSERT INTO locations (id, patient_id, lat, lng, timestamp)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_location.patient_id)
        .bind(new_location.lat)
        .bind(new_location.lng)
        .bind(new_location.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn latest_location(&self, patient_id: PrimaryKey) -> Result<LocationData> {
        query_as(
            "SELECT * FROM locations WHERE patient_id = $1 ORDER BY timestamp DESC LIMIT 1",
        )
        .bind(patient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("location", "patient_id"))
    }

    async fn create_vital(&self, new_vital: NewVital) -> Result<VitalData> {
        query_as(
            "INSERT INTO vitals (id, patient_id, heart_rate, body_temp, spo2, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_vital.patient_id)
        .bind(new_vital.heart_rate)
        .bind(new_vital.body_temp)
        .bind(new_vital.spo2)
        .bind(new_vital.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn latest_vital(&self, patient_id: PrimaryKey) -> Result<VitalData> {
        query_as("SELECT * FROM vitals WHERE patient_id = $1 ORDER BY timestamp DESC LIMIT 1")
            .bind(patient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("vital", "patient_id"))
    }

    async fn vitals_since(
        &self,
        patient_id: PrimaryKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<VitalData>> {
        query_as(
            "SELECT * FROM vitals WHERE patient_id = $1 AND timestamp >= $2 ORDER BY timestamp DESC",
        )
        .bind(patient_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_alert(&self, new_alert: NewAlert) -> Result<AlertData> {
        query_as::<_, AlertRow>(
            "INSERT INTO alerts (id, patient_id, kind, message, created_at, resolved)
            VALUES ($1, $2, $3, $4, $5, FALSE) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_alert.patient_id)
        .bind(new_alert.kind.as_str())
        .bind(new_alert.message)
        .bind(new_alert.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?
        .try_into()
    }

    async fn alerts_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<AlertData>> {
        query_as::<_, AlertRow>(
            "SELECT * FROM alerts WHERE patient_id = $1 ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?
        .into_iter()
        .map(AlertData::try_from)
        .collect()
    }

    async fn create_reminder(&self, new_reminder: NewReminder) -> Result<ReminderData> {
        query_as(
            "INSERT INTO reminders (id, patient_id, title, due_at, notes, acknowledged)
            VALUES ($1, $2, $3, $4, $5, FALSE) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_reminder.patient_id)
        .bind(new_reminder.title)
        .bind(new_reminder.when)
        .bind(new_reminder.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn due_reminders(
        &self,
        patient_id: PrimaryKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderData>> {
        query_as(
            "SELECT * FROM reminders
            WHERE patient_id = $1 AND due_at <= $2 AND acknowledged = FALSE
            ORDER BY due_at",
        )
        .bind(patient_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn acknowledge_reminder(&self, reminder_id: PrimaryKey) -> Result<()> {
        let result = query("UPDATE reminders SET acknowledged = TRUE WHERE id = $1")
            .bind(reminder_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("reminder", "id"));
        }

        Ok(())
    }

    async fn create_device(&self, new_device: NewDevice) -> Result<DeviceData> {
        query_as(
            "INSERT INTO devices (id, patient_id, device_name, device_token, registered_at)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_device.patient_id)
        .bind(new_device.device_name)
        .bind(&new_device.device_token)
        .bind(new_device.registered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.conflict_or("device", "device_token", &new_device.device_token))
    }

    async fn device_by_token(&self, token: &str) -> Result<DeviceData> {
        query_as("SELECT * FROM devices WHERE device_token = $1")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("device", "device_token"))
    }

    async fn devices_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DeviceData>> {
        query_as("SELECT * FROM devices WHERE patient_id = $1 ORDER BY registered_at")
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_mood(&self, new_mood: NewMood) -> Result<MoodData> {
        query_as::<_, MoodRow>(
            "INSERT INTO moods (id, patient_id, mood, note, timestamp)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_mood.patient_id)
        .bind(new_mood.mood.as_str())
        .bind(new_mood.note)
        .bind(new_mood.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?
        .try_into()
    }

    async fn moods_since(
        &self,
        patient_id: PrimaryKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodData>> {
        query_as::<_, MoodRow>(
            "SELECT * FROM moods WHERE patient_id = $1 AND timestamp >= $2 ORDER BY timestamp",
        )
        .bind(patient_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?
        .into_iter()
        .map(MoodData::try_from)
        .collect()
    }

    async fn create_comfort_message(
        &self,
        new_message: NewComfortMessage,
    ) -> Result<ComfortMessageData> {
        query_as(
            "INSERT INTO comfort_messages (id, patient_id, message, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_message.patient_id)
        .bind(new_message.message)
        .bind(new_message.created_by)
        .bind(new_message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn latest_comfort_message(&self, patient_id: PrimaryKey) -> Result<ComfortMessageData> {
        query_as(
            "SELECT * FROM comfort_messages WHERE patient_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(patient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("comfort message", "patient_id"))
    }

    async fn create_family_message(
        &self,
        new_message: NewFamilyMessage,
    ) -> Result<FamilyMessageData> {
        query_as(
            "INSERT INTO family_messages (id, patient_id, from_user, message, created_at)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_message.patient_id)
        .bind(new_message.from_user)
        .bind(new_message.message)
        .bind(new_message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn latest_family_message(&self, patient_id: PrimaryKey) -> Result<FamilyMessageData> {
        query_as(
            "SELECT * FROM family_messages WHERE patient_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(patient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("family message", "patient_id"))
    }

    async fn create_family_image(&self, new_image: NewFamilyImage) -> Result<FamilyImageData> {
        query_as(
            "INSERT INTO family_images (id, patient_id, uploaded_by, image_url, caption, created_at)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_image.patient_id)
        .bind(new_image.uploaded_by)
        .bind(new_image.image_url)
        .bind(new_image.caption)
        .bind(new_image.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn family_images_by_patient(
        &self,
        patient_id: PrimaryKey,
    ) -> Result<Vec<FamilyImageData>> {
        query_as("SELECT * FROM family_images WHERE patient_id = $1 ORDER BY created_at DESC")
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_daily_log(&self, new_log: NewDailyLog) -> Result<DailyLogData> {
        query_as(
            "INSERT INTO daily_logs (id, patient_id, caretaker_id, entry, timestamp)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_log.patient_id)
        .bind(new_log.caretaker_id)
        .bind(new_log.entry)
        .bind(new_log.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn daily_logs_by_patient(&self, patient_id: PrimaryKey) -> Result<Vec<DailyLogData>> {
        query_as("SELECT * FROM daily_logs WHERE patient_id = $1 ORDER BY timestamp DESC")
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }
}

trait IntoConflict {
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
}

impl IntoConflict for SqlxError {
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str) -> DatabaseError {
        let is_unique_violation = self
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation());

        if is_unique_violation {
            DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }
        } else {
            self.any()
        }
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}

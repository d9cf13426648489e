use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    util::lookback, CareConfig, CareContext, ComfortMessageData, DailyLogData, DatabaseError, FamilyImageData,
    FamilyMessageData, Mood, MoodData, NewComfortMessage, NewDailyLog, NewFamilyImage,
    NewFamilyMessage, NewMood, PrimaryKey, Result, SharedDatabase,
};

/// Handles what the family and caretakers share with a patient, and how the patient feels
pub struct Family {
    db: SharedDatabase,
    config: Arc<CareConfig>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl Family {
    pub const DEFAULT_TREND_DAYS: i64 = 7;
    /// The path uploaded images are served under
    pub const IMAGE_URL_PREFIX: &'static str = "/static/family_images";

    pub fn new(context: &CareContext) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
        }
    }

    pub async fn log_mood(&self, new_mood: NewPlainMood) -> Result<MoodData> {
        self.db
            .create_mood(NewMood {
                patient_id: new_mood.patient_id,
                mood: new_mood.mood,
                note: new_mood.note,
                timestamp: new_mood.timestamp.unwrap_or_else(Utc::now),
            })
            .await
    }

    /// Moods from the last `days`, oldest first
    pub async fn mood_trend(&self, patient_id: PrimaryKey, days: Option<i64>) -> Result<Vec<MoodData>> {
        let days = days.unwrap_or(Self::DEFAULT_TREND_DAYS);
        let since = lookback(days, Duration::try_days);

        self.db.moods_since(patient_id, since).await
    }

    pub async fn add_comfort(
        &self,
        patient_id: PrimaryKey,
        created_by: PrimaryKey,
        message: String,
    ) -> Result<ComfortMessageData> {
        self.db
            .create_comfort_message(NewComfortMessage {
                patient_id,
                message,
                created_by,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn latest_comfort(&self, patient_id: PrimaryKey) -> Result<ComfortMessageData> {
        self.db.latest_comfort_message(patient_id).await
    }

    pub async fn add_family_message(
        &self,
        patient_id: PrimaryKey,
        from_user: PrimaryKey,
        message: String,
    ) -> Result<FamilyMessageData> {
        self.db
            .create_family_message(NewFamilyMessage {
                patient_id,
                from_user,
                message,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn latest_family_message(&self, patient_id: PrimaryKey) -> Result<FamilyMessageData> {
        self.db.latest_family_message(patient_id).await
    }

    /// Writes an uploaded image to the upload directory and records where it is served from
    pub async fn add_family_image(
        &self,
        upload: NewUpload,
    ) -> std::result::Result<FamilyImageData, UploadError> {
        let now = Utc::now();
        let file_name = format!(
            "{}_{}",
            now.timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );

        let upload_dir = &self.config.upload_dir;
        tokio::fs::create_dir_all(upload_dir).await?;
        tokio::fs::write(upload_dir.join(&file_name), &upload.bytes).await?;

        log::debug!(
            "Stored {} bytes as {} for patient {}",
            upload.bytes.len(),
            file_name,
            upload.patient_id
        );

        let image = self
            .db
            .create_family_image(NewFamilyImage {
                patient_id: upload.patient_id,
                uploaded_by: upload.uploaded_by,
                image_url: format!("{}/{}", Self::IMAGE_URL_PREFIX, file_name),
                caption: upload.caption,
                created_at: now,
            })
            .await?;

        Ok(image)
    }

    /// Newest first
    pub async fn family_images(&self, patient_id: PrimaryKey) -> Result<Vec<FamilyImageData>> {
        self.db.family_images_by_patient(patient_id).await
    }

    pub async fn add_log(
        &self,
        patient_id: PrimaryKey,
        caretaker_id: PrimaryKey,
        entry: String,
    ) -> Result<DailyLogData> {
        self.db
            .create_daily_log(NewDailyLog {
                patient_id,
                caretaker_id,
                entry,
                timestamp: Utc::now(),
            })
            .await
    }

    /// Newest first
    pub async fn logs(&self, patient_id: PrimaryKey) -> Result<Vec<DailyLogData>> {
        self.db.daily_logs_by_patient(patient_id).await
    }
}

/// Keeps only the last path component, replacing anything unusual with underscores
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let sanitized: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    match sanitized.trim_start_matches('.') {
        "" => "upload".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[derive(Debug)]
pub struct NewPlainMood {
    pub patient_id: PrimaryKey,
    pub mood: Mood,
    pub note: Option<String>,
    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewUpload {
    pub patient_id: PrimaryKey,
    pub uploaded_by: PrimaryKey,
    pub caption: Option<String>,
    /// The name the client gave the file
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{sanitize_file_name, NewPlainMood, NewUpload};
    use crate::{test_util::care, Care, CareConfig, MemoryDatabase, Mood};

    fn mood(patient_id: Uuid, mood: Mood, days_ago: i64) -> NewPlainMood {
        NewPlainMood {
            patient_id,
            mood,
            note: None,
            timestamp: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("grandkids.jpg"), "grandkids.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\beach day.png"), "beach_day.png");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn mood_trend_is_windowed_and_oldest_first() {
        let care = care();
        let patient_id = Uuid::new_v4();

        care.family.log_mood(mood(patient_id, Mood::Good, 1)).await.unwrap();
        care.family.log_mood(mood(patient_id, Mood::Low, 3)).await.unwrap();
        care.family.log_mood(mood(patient_id, Mood::Okay, 10)).await.unwrap();

        let trend = care.family.mood_trend(patient_id, None).await.unwrap();
        let moods: Vec<_> = trend.iter().map(|m| m.mood).collect();

        assert_eq!(moods, vec![Mood::Low, Mood::Good]);

        let wider = care.family.mood_trend(patient_id, Some(30)).await.unwrap();
        assert_eq!(wider.len(), 3);
        assert_eq!(wider[0].mood, Mood::Okay);

        let everything = care.family.mood_trend(patient_id, Some(i64::MAX)).await.unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn latest_messages() {
        let care = care();
        let patient_id = Uuid::new_v4();
        let caretaker_id = Uuid::new_v4();

        assert!(care
            .family
            .latest_comfort(patient_id)
            .await
            .unwrap_err()
            .is_not_found());

        care.family
            .add_comfort(patient_id, caretaker_id, "You are safe".to_string())
            .await
            .unwrap();
        care.family
            .add_comfort(patient_id, caretaker_id, "We love you".to_string())
            .await
            .unwrap();

        let comfort = care.family.latest_comfort(patient_id).await.unwrap();
        assert_eq!(comfort.message, "We love you");

        care.family
            .add_family_message(patient_id, caretaker_id, "Visiting sunday".to_string())
            .await
            .unwrap();

        let message = care.family.latest_family_message(patient_id).await.unwrap();
        assert_eq!(message.message, "Visiting sunday");
        assert_eq!(message.from_user, caretaker_id);
    }

    #[tokio::test]
    async fn logs_are_newest_first() {
        let care = care();
        let patient_id = Uuid::new_v4();
        let caretaker_id = Uuid::new_v4();

        care.family
            .add_log(patient_id, caretaker_id, "Slept well".to_string())
            .await
            .unwrap();
        let last = care
            .family
            .add_log(patient_id, caretaker_id, "Ate lunch".to_string())
            .await
            .unwrap();

        let logs = care.family.logs(patient_id).await.unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, last.id);
    }

    #[tokio::test]
    async fn upload_is_written_and_listed() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("family_images");

        let care = Care::new(
            MemoryDatabase::new(),
            CareConfig {
                upload_dir: upload_dir.clone(),
                ..CareConfig::new("test-secret")
            },
        );
        let patient_id = Uuid::new_v4();

        let image = care
            .family
            .add_family_image(NewUpload {
                patient_id,
                uploaded_by: Uuid::new_v4(),
                caption: Some("Beach".to_string()),
                file_name: "beach day.jpg".to_string(),
                bytes: vec![0xff, 0xd8, 0xff],
            })
            .await
            .unwrap();

        let file_name = image
            .image_url
            .strip_prefix("/static/family_images/")
            .unwrap();
        assert!(file_name.ends_with("_beach_day.jpg"));

        let written = std::fs::read(upload_dir.join(file_name)).unwrap();
        assert_eq!(written, vec![0xff, 0xd8, 0xff]);

        let images = care.family.family_images(patient_id).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].caption.as_deref(), Some("Beach"));
    }
}

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{auth, devices, family, locations, logs, moods, patients, reminders, vitals};
use crate::{schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        patients::create_patient,
        patients::list_patients,
        locations::ping,
        locations::latest,
        locations::alerts,
        locations::sos,
        vitals::submit,
        vitals::latest,
        vitals::history,
        reminders::create_reminder,
        reminders::due,
        reminders::acknowledge,
        devices::register_device,
        devices::list_devices,
        moods::log_mood,
        moods::trend,
        family::upload,
        family::images,
        family::send_message,
        family::latest_message,
        family::add_comfort,
        family::latest_comfort,
        logs::add_log,
        logs::logs,
        crate::health,
    ),
    components(schemas(
        schemas::RegisterSchema,
        schemas::LoginSchema,
        schemas::NewPatientSchema,
        schemas::PingSchema,
        schemas::ReadingSchema,
        schemas::NewReminderSchema,
        schemas::NewDeviceSchema,
        schemas::NewMoodSchema,
        schemas::NewMessageSchema,
        schemas::NewLogSchema,
        schemas::UploadSchema,
        serialized::User,
        serialized::LoginResult,
        serialized::Patient,
        serialized::Location,
        serialized::Alert,
        serialized::Vital,
        serialized::Reminder,
        serialized::Device,
        serialized::Mood,
        serialized::ComfortMessage,
        serialized::FamilyImage,
        serialized::FamilyMessage,
        serialized::DailyLog,
        serialized::Confirmation,
        serialized::Health,
    )),
    modifiers(&Security),
    info(
        title = "sara",
        description = "sara-server exposes endpoints to coordinate the care of patients"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

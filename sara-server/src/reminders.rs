use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::{NewReminder, PrimaryKey};

use crate::{
    auth::{Caretaker, Session},
    errors::ServerResult,
    schemas::{IdPath, NewReminderSchema, ValidatedJson},
    serialized::{Confirmation, Reminder, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/reminders",
    tag = "reminders",
    request_body = NewReminderSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Reminder),
        (status = 404, description = "The patient does not exist or belongs to another caretaker")
    )
)]
async fn create_reminder(
    caretaker: Caretaker,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewReminderSchema>,
) -> ServerResult<Json<Reminder>> {
    let reminder = context
        .care
        .patients
        .create_reminder(
            caretaker.identity().id(),
            NewReminder {
                patient_id: body.patient_id,
                title: body.title,
                when: body.when,
                notes: body.notes,
            },
        )
        .await?;

    Ok(Json(reminder.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/reminders/due/{patient_id}",
    tag = "reminders",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Reminder>, description = "Unacknowledged reminders that are due, earliest first")
    )
)]
async fn due(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vec<Reminder>>> {
    let reminders = context.care.patients.due_reminders(patient_id).await?;

    Ok(Json(reminders.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/reminders/{id}/ack",
    tag = "reminders",
    params(
        ("id" = PrimaryKey, Path, description = "The reminder")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Confirmation),
        (status = 404, description = "The reminder does not exist")
    )
)]
async fn acknowledge(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(reminder_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Confirmation>> {
    context
        .care
        .patients
        .acknowledge_reminder(reminder_id)
        .await?;

    Ok(Json(Confirmation::ok()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_reminder))
        .route("/due/:patient_id", get(due))
        .route("/:id/ack", post(acknowledge))
}

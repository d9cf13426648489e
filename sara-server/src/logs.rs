use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::PrimaryKey;

use crate::{
    auth::Caretaker,
    errors::ServerResult,
    schemas::{IdPath, NewLogSchema, ValidatedJson},
    serialized::{DailyLog, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/logs",
    tag = "logs",
    request_body = NewLogSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = DailyLog)
    )
)]
async fn add_log(
    caretaker: Caretaker,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewLogSchema>,
) -> ServerResult<Json<DailyLog>> {
    let entry = context
        .care
        .family
        .add_log(body.patient_id, caretaker.identity().id(), body.entry)
        .await?;

    Ok(Json(entry.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/logs/{patient_id}",
    tag = "logs",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<DailyLog>, description = "Entries of the patient, newest first")
    )
)]
async fn logs(
    _caretaker: Caretaker,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vec<DailyLog>>> {
    let logs = context.care.family.logs(patient_id).await?;

    Ok(Json(logs.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_log))
        .route("/:patient_id", get(logs))
}

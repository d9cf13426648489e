use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::{NewReading, PrimaryKey};

use crate::{
    auth::Device,
    errors::ServerResult,
    schemas::{HistoryQuery, IdPath, ReadingSchema, ValidatedJson, ValidatedQuery},
    serialized::{ToSerialized, Vital},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/vitals",
    tag = "vitals",
    request_body = ReadingSchema,
    params(
        ("device-token" = String, Header, description = "The token issued when the device was registered")
    ),
    responses(
        (status = 200, body = Vital, description = "The stored reading, an alert is raised if it crossed a threshold"),
        (status = 401, description = "Missing or unknown device token")
    )
)]
async fn submit(
    device: Device,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<ReadingSchema>,
) -> ServerResult<Json<Vital>> {
    log::debug!(
        "Device {} submitted a reading for patient {}",
        device.data().id,
        body.patient_id
    );

    let tracked = context
        .care
        .tracking
        .record_vitals(NewReading {
            patient_id: body.patient_id,
            heart_rate: body.heart_rate,
            body_temp: body.body_temp,
            spo2: body.spo2,
        })
        .await?;

    Ok(Json(tracked.record.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/vitals/latest/{patient_id}",
    tag = "vitals",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    responses(
        (status = 200, body = Vital),
        (status = 404, description = "No readings yet")
    )
)]
async fn latest(
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vital>> {
    let vital = context.care.tracking.latest_vitals(patient_id).await?;

    Ok(Json(vital.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/vitals/history/{patient_id}",
    tag = "vitals",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient"),
        HistoryQuery
    ),
    responses(
        (status = 200, body = Vec<Vital>, description = "Readings in the window, newest first")
    )
)]
async fn history(
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> ServerResult<Json<Vec<Vital>>> {
    let vitals = context
        .care
        .tracking
        .vitals_history(patient_id, query.hours)
        .await?;

    Ok(Json(vitals.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/latest/:patient_id", get(latest))
        .route("/history/:patient_id", get(history))
}

use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::{NewPing, PrimaryKey};

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{IdPath, PingSchema, ValidatedJson},
    serialized::{Alert, Confirmation, Location, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/locations/ping",
    tag = "locations",
    request_body = PingSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Confirmation, description = "The ping was stored, an alert is raised if it left the safe zone")
    )
)]
async fn ping(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<PingSchema>,
) -> ServerResult<Json<Confirmation>> {
    context
        .care
        .tracking
        .record_ping(NewPing {
            patient_id: body.patient_id,
            lat: body.lat,
            lng: body.lng,
            timestamp: body.timestamp,
        })
        .await?;

    Ok(Json(Confirmation::ok()))
}

#[utoipa::path(
    get,
    path = "/api/locations/latest/{patient_id}",
    tag = "locations",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Location),
        (status = 404, description = "No locations yet")
    )
)]
async fn latest(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Location>> {
    let location = context.care.tracking.latest_location(patient_id).await?;

    Ok(Json(location.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/locations/alerts/{patient_id}",
    tag = "locations",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Alert>, description = "Alerts of the patient, newest first")
    )
)]
async fn alerts(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vec<Alert>>> {
    let alerts = context.care.alerts.list(patient_id).await?;

    Ok(Json(alerts.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/sos/{patient_id}",
    tag = "sos",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient asking for help")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Confirmation)
    )
)]
async fn sos(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Confirmation>> {
    context.care.alerts.sos(patient_id).await?;

    Ok(Json(Confirmation::ok()))
}

pub fn router() -> Router {
    Router::new()
        .route("/ping", post(ping))
        .route("/latest/:patient_id", get(latest))
        .route("/alerts/:patient_id", get(alerts))
}

pub fn sos_router() -> Router {
    Router::new().route("/:patient_id", post(sos))
}

use axum::{extract::State, routing::get, Json};
use sara_care::NewPlainPatient;

use crate::{
    auth::Caretaker,
    errors::ServerResult,
    schemas::{NewPatientSchema, ValidatedJson},
    serialized::{Patient, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/patients",
    tag = "patients",
    request_body = NewPatientSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Patient),
        (status = 404, description = "The caretaker does not exist")
    )
)]
async fn create_patient(
    _caretaker: Caretaker,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewPatientSchema>,
) -> ServerResult<Json<Patient>> {
    let patient = context
        .care
        .patients
        .create_patient(NewPlainPatient {
            name: body.name,
            caretaker_id: body.caretaker_id,
            safe_center_lat: body.safe_center_lat,
            safe_center_lng: body.safe_center_lng,
            safe_radius_m: body.safe_radius_m,
        })
        .await?;

    Ok(Json(patient.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/patients",
    tag = "patients",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Patient>)
    )
)]
async fn list_patients(
    caretaker: Caretaker,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Patient>>> {
    let patients = context
        .care
        .patients
        .list_patients(caretaker.identity().id())
        .await?;

    Ok(Json(patients.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/", get(list_patients).post(create_patient))
}

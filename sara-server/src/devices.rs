use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::{NewPlainDevice, PrimaryKey};

use crate::{
    auth::Caretaker,
    errors::ServerResult,
    schemas::{IdPath, NewDeviceSchema, ValidatedJson},
    serialized::{Device, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/devices/register",
    tag = "devices",
    request_body = NewDeviceSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Device, description = "The device along with the token it submits readings with")
    )
)]
async fn register_device(
    _caretaker: Caretaker,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewDeviceSchema>,
) -> ServerResult<Json<Device>> {
    let device = context
        .care
        .auth
        .register_device(NewPlainDevice {
            patient_id: body.patient_id,
            device_name: body.device_name,
        })
        .await?;

    Ok(Json(device.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/devices/{patient_id}",
    tag = "devices",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Device>)
    )
)]
async fn list_devices(
    _caretaker: Caretaker,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vec<Device>>> {
    let devices = context.care.auth.devices_for_patient(patient_id).await?;

    Ok(Json(devices.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register_device))
        .route("/:patient_id", get(list_devices))
}

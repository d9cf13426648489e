use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json,
};
use sara_care::{NewUpload, PrimaryKey};

use crate::{
    auth::{Caretaker, Session},
    errors::{ServerError, ServerResult},
    schemas::{IdPath, NewMessageSchema, UploadSchema, ValidatedJson},
    serialized::{ComfortMessage, FamilyImage, FamilyMessage, ToSerialized},
    Router, ServerContext,
};

/// The largest image accepted by the upload endpoint
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const MALFORMED_UPLOAD: ServerError = ServerError::Invalid("Malformed upload");

#[utoipa::path(
    post,
    path = "/api/family/upload",
    tag = "family",
    request_body(content = UploadSchema, content_type = "multipart/form-data"),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = FamilyImage),
        (status = 422, description = "A field is missing or malformed")
    )
)]
async fn upload(
    caretaker: Caretaker,
    State(context): State<ServerContext>,
    mut multipart: Multipart,
) -> ServerResult<Json<FamilyImage>> {
    let mut patient_id = None;
    let mut caption = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| MALFORMED_UPLOAD)?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "patient_id" => {
                let text = field.text().await.map_err(|_| MALFORMED_UPLOAD)?;
                let id = text
                    .trim()
                    .parse::<PrimaryKey>()
                    .map_err(|_| ServerError::Invalid("Invalid patient_id"))?;

                patient_id = Some(id);
            }
            "caption" => {
                caption = Some(field.text().await.map_err(|_| MALFORMED_UPLOAD)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|_| MALFORMED_UPLOAD)?;

                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let patient_id = patient_id.ok_or(ServerError::Invalid("Missing patient_id"))?;
    let (file_name, bytes) = file.ok_or(ServerError::Invalid("Missing file"))?;

    let image = context
        .care
        .family
        .add_family_image(NewUpload {
            patient_id,
            uploaded_by: caretaker.identity().id(),
            caption,
            file_name,
            bytes,
        })
        .await?;

    Ok(Json(image.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/family/{patient_id}",
    tag = "family",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<FamilyImage>, description = "Images of the patient, newest first")
    )
)]
async fn images(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<Vec<FamilyImage>>> {
    let images = context.care.family.family_images(patient_id).await?;

    Ok(Json(images.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/family/message",
    tag = "family",
    request_body = NewMessageSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = FamilyMessage)
    )
)]
async fn send_message(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewMessageSchema>,
) -> ServerResult<Json<FamilyMessage>> {
    let message = context
        .care
        .family
        .add_family_message(body.patient_id, session.identity().id(), body.message)
        .await?;

    Ok(Json(message.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/family/message/latest/{patient_id}",
    tag = "family",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = FamilyMessage),
        (status = 404, description = "No messages yet")
    )
)]
async fn latest_message(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<FamilyMessage>> {
    let message = context.care.family.latest_family_message(patient_id).await?;

    Ok(Json(message.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/comfort",
    tag = "comfort",
    request_body = NewMessageSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ComfortMessage)
    )
)]
async fn add_comfort(
    caretaker: Caretaker,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewMessageSchema>,
) -> ServerResult<Json<ComfortMessage>> {
    let message = context
        .care
        .family
        .add_comfort(body.patient_id, caretaker.identity().id(), body.message)
        .await?;

    Ok(Json(message.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/comfort/{patient_id}",
    tag = "comfort",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ComfortMessage),
        (status = 404, description = "No comforting message yet")
    )
)]
async fn latest_comfort(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
) -> ServerResult<Json<ComfortMessage>> {
    let message = context.care.family.latest_comfort(patient_id).await?;

    Ok(Json(message.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/message", post(send_message))
        .route("/message/latest/:patient_id", get(latest_message))
        .route("/:patient_id", get(images))
}

pub fn comfort_router() -> Router {
    Router::new()
        .route("/", post(add_comfort))
        .route("/:patient_id", get(latest_comfort))
}

use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use sara_care::{NewPlainMood, PrimaryKey};

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{IdPath, NewMoodSchema, TrendQuery, ValidatedJson, ValidatedQuery},
    serialized::{Mood, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/moods",
    tag = "moods",
    request_body = NewMoodSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Mood)
    )
)]
async fn log_mood(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewMoodSchema>,
) -> ServerResult<Json<Mood>> {
    let mood = context
        .care
        .family
        .log_mood(NewPlainMood {
            patient_id: body.patient_id,
            mood: body.mood,
            note: body.note,
            timestamp: body.timestamp,
        })
        .await?;

    Ok(Json(mood.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/moods/trend/{patient_id}",
    tag = "moods",
    params(
        ("patient_id" = PrimaryKey, Path, description = "The patient"),
        TrendQuery
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Mood>, description = "Moods in the window, oldest first")
    )
)]
async fn trend(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(patient_id): IdPath<PrimaryKey>,
    ValidatedQuery(query): ValidatedQuery<TrendQuery>,
) -> ServerResult<Json<Vec<Mood>>> {
    let moods = context
        .care
        .family
        .mood_trend(patient_id, query.days)
        .await?;

    Ok(Json(moods.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(log_mood))
        .route("/trend/:patient_id", get(trend))
}

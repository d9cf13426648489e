use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use sara_care::{Mood, PrimaryKey, Role};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct RegisterSchema {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
    #[validate(length(max = 128))]
    pub name: String,
    #[schema(value_type = String, example = "caretaker")]
    pub role: Role,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct LoginSchema {
    #[validate(length(max = 254))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewPatientSchema {
    #[validate(length(max = 128))]
    pub name: String,
    pub caretaker_id: PrimaryKey,
    pub safe_center_lat: f64,
    pub safe_center_lng: f64,
    /// Defaults to 150 meters
    pub safe_radius_m: Option<f64>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct PingSchema {
    pub patient_id: PrimaryKey,
    pub lat: f64,
    pub lng: f64,
    /// Defaults to the time the ping is received
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct ReadingSchema {
    pub patient_id: PrimaryKey,
    pub heart_rate: i32,
    pub body_temp: f64,
    pub spo2: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewReminderSchema {
    pub patient_id: PrimaryKey,
    #[validate(length(max = 256))]
    pub title: String,
    pub when: DateTime<Utc>,
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewDeviceSchema {
    pub patient_id: PrimaryKey,
    #[validate(length(max = 128))]
    pub device_name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewMoodSchema {
    pub patient_id: PrimaryKey,
    #[schema(value_type = String, example = "good")]
    pub mood: Mood,
    #[validate(length(max = 2048))]
    pub note: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Used for comfort messages and family messages alike
#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewMessageSchema {
    pub patient_id: PrimaryKey,
    #[validate(length(max = 2048))]
    pub message: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct NewLogSchema {
    pub patient_id: PrimaryKey,
    #[validate(length(max = 4096))]
    pub entry: String,
}

/// The multipart form accepted by the image upload
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadSchema {
    #[schema(value_type = String, format = Uuid)]
    pub patient_id: String,
    pub caption: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, IntoParams, Validate, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// How many hours back to look, 24 by default
    pub hours: Option<i64>,
}

#[derive(Debug, IntoParams, Validate, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    /// How many days back to look, 7 by default
    pub days: Option<i64>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}

pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "Query parse failed"))?;

        query
            .validate()
            .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "Query is invalid"))?;

        Ok(Self(query))
    }
}

/// Like [Path], but a malformed id is a validation failure rather than a bad request
pub struct IdPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "Invalid id in path"))?;

        Ok(Self(value))
    }
}

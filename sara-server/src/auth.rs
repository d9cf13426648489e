use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    routing::post,
    Json,
};
use sara_care::{AuthError, Credentials, DeviceData, Identity, NewPlainUser, Role};

use crate::{
    errors::ServerResult,
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, ToSerialized, User},
    Router, ServerContext,
};

/// The header wearables authenticate with
pub const DEVICE_TOKEN_HEADER: &str = "device-token";

/// Wraps [Identity] so [FromRequestParts] can be implemented for it
pub struct Session(Identity);

impl Session {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let segments: Vec<_> = token.split_ascii_whitespace().collect();

        let token = match segments.as_slice() {
            [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => *token,
            _ => return Err((StatusCode::UNAUTHORIZED, "Authorization must be Bearer")),
        };

        let identity = context
            .care
            .auth
            .authenticate(token)
            .await
            .map_err(|e| reject(e, "Invalid or expired token"))?;

        Ok(Self(identity))
    }
}

/// Turns a failed authentication into a rejection. Only storage failures are not the client's fault.
fn reject(error: AuthError, message: &'static str) -> (StatusCode, &'static str) {
    match error {
        AuthError::Db(e) if !e.is_not_found() => {
            log::error!("Authentication lookup failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        _ => (StatusCode::UNAUTHORIZED, message),
    }
}

/// A session whose user is a caretaker
pub struct Caretaker(Identity);

impl Caretaker {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Caretaker {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let Session(identity) = Session::from_request_parts(parts, state).await?;

        identity
            .require_role(Role::Caretaker)
            .map_err(|_| (StatusCode::FORBIDDEN, "Caretaker role required"))?;

        Ok(Self(identity))
    }
}

/// A wearable identified by the token in its request headers
pub struct Device(DeviceData);

impl Device {
    pub fn data(&self) -> &DeviceData {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Device {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = parts
            .headers
            .get(DEVICE_TOKEN_HEADER)
            .and_then(|x| x.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing device token"))?;

        let device = context
            .care
            .auth
            .authenticate_device(token)
            .await
            .map_err(|e| reject(e, "Invalid device token"))?;

        Ok(Self(device))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 200, body = User),
        (status = 400, description = "Email is already registered"),
        (status = 422, description = "Request body is invalid")
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .care
        .auth
        .register(NewPlainUser {
            email: body.email,
            password: body.password,
            name: body.name,
            role: body.role,
        })
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult),
        (status = 401, description = "Email or password is incorrect")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let login = context
        .care
        .auth
        .login(Credentials {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(login.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

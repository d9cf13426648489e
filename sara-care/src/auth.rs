use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::{
    util::random_hex, CareConfig, CareContext, DatabaseError, DeviceData, NewDevice, NewUser,
    PrimaryKey, Role, SharedDatabase, UserData,
};

pub struct Auth {
    db: SharedDatabase,
    config: Arc<CareConfig>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The bearer token is malformed, expired, or its user is gone
    #[error("Invalid token")]
    InvalidToken,
    #[error("Not permitted")]
    Forbidden,
    #[error("Unknown device")]
    UnknownDevice,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
    #[error("TokenError: {0}")]
    Token(jsonwebtoken::errors::Error),
}

/// What a bearer token carries
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The user id
    sub: String,
    role: Role,
    /// Unix timestamp in seconds
    exp: i64,
}

impl Auth {
    /// Bytes of randomness in a device token
    const DEVICE_TOKEN_BYTES: usize = 16;

    pub fn new(context: &CareContext) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
            argon: Argon2::default(),
        }
    }

    /// Creates a user with a hashed password
    pub async fn register(&self, new_user: NewPlainUser) -> Result<UserData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                email: new_user.email,
                password: hashed_password,
                name: new_user.name,
                role: new_user.role,
            })
            .await
            .map_err(AuthError::Db)?;

        log::info!("Registered {} {}", user.role.as_str(), user.id);

        Ok(user)
    }

    /// Logs in a user, returning a signed bearer token
    pub async fn login(&self, credentials: Credentials) -> Result<LoginData, AuthError> {
        let user = self
            .db
            .user_by_email(&credentials.email)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let expires_at = Utc::now() + self.config.token_lifetime;
        let access_token = self.issue_token(user.id, user.role, expires_at)?;

        Ok(LoginData {
            access_token,
            token_type: "bearer",
            role: user.role,
        })
    }

    /// Resolves a bearer token to the user it was issued for
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::InvalidToken)?
        .claims;

        let user_id: PrimaryKey = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        let user = self.db.user_by_id(user_id).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::InvalidToken,
            err => AuthError::Db(err),
        })?;

        Ok(Identity { user })
    }

    /// Registers a wearable to a patient, generating the token it authenticates with
    pub async fn register_device(&self, new_device: NewPlainDevice) -> Result<DeviceData, AuthError> {
        let device = self
            .db
            .create_device(NewDevice {
                patient_id: new_device.patient_id,
                device_name: new_device.device_name,
                device_token: random_hex(Self::DEVICE_TOKEN_BYTES),
                registered_at: Utc::now(),
            })
            .await
            .map_err(AuthError::Db)?;

        log::info!(
            "Registered device {} for patient {}",
            device.id,
            device.patient_id
        );

        Ok(device)
    }

    /// Returns the device a token belongs to
    pub async fn authenticate_device(&self, token: &str) -> Result<DeviceData, AuthError> {
        self.db.device_by_token(token).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::UnknownDevice,
            err => AuthError::Db(err),
        })
    }

    pub async fn devices_for_patient(
        &self,
        patient_id: PrimaryKey,
    ) -> Result<Vec<DeviceData>, DatabaseError> {
        self.db.devices_by_patient(patient_id).await
    }

    fn issue_token(
        &self,
        user_id: PrimaryKey,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(AuthError::Token)
    }
}

/// An authenticated user
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: UserData,
}

impl Identity {
    pub fn id(&self) -> PrimaryKey {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Fails with [AuthError::Forbidden] unless the user has the given role
    pub fn require_role(&self, role: Role) -> Result<(), AuthError> {
        if self.user.role == role {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPlainUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug)]
pub struct NewPlainDevice {
    pub patient_id: PrimaryKey,
    pub device_name: String,
}

#[derive(Debug, Clone)]
pub struct LoginData {
    pub access_token: String,
    pub token_type: &'static str,
    pub role: Role,
}

mod alerts;
mod auth;
mod db;
mod family;
mod patients;
mod tracking;
mod util;

use std::{path::PathBuf, sync::Arc};

use chrono::Duration;

pub use alerts::*;
pub use auth::*;
pub use db::*;
pub use family::*;
pub use patients::*;
pub use tracking::*;

/// Settings the care system needs at startup
#[derive(Debug, Clone)]
pub struct CareConfig {
    /// The secret bearer tokens are signed with
    pub jwt_secret: String,
    /// How long a bearer token stays valid after login
    pub token_lifetime: Duration,
    /// Where uploaded family images are written to
    pub upload_dir: PathBuf,
    pub thresholds: sara_core::Config,
}

impl CareConfig {
    pub const DEFAULT_TOKEN_LIFETIME_IN_MINUTES: i64 = 60;
    pub const DEFAULT_UPLOAD_DIR: &'static str = "static/family_images";

    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_lifetime: Duration::minutes(Self::DEFAULT_TOKEN_LIFETIME_IN_MINUTES),
            upload_dir: PathBuf::from(Self::DEFAULT_UPLOAD_DIR),
            thresholds: Default::default(),
        }
    }
}

/// The sara care system, facilitating authentication, tracking, alerting, and more.
pub struct Care {
    pub auth: Auth,
    pub alerts: Alerts,
    pub tracking: Tracking,
    pub patients: Patients,
    pub family: Family,
}

/// A type passed to the components of the care system, to access storage and settings.
#[derive(Clone)]
pub struct CareContext {
    pub database: SharedDatabase,
    pub config: Arc<CareConfig>,
}

impl Care {
    pub fn new<Db>(database: Db, config: CareConfig) -> Self
    where
        Db: Database + 'static,
    {
        let context = CareContext {
            database: Arc::new(database),
            config: Arc::new(config),
        };

        Self {
            auth: Auth::new(&context),
            alerts: Alerts::new(&context),
            tracking: Tracking::new(&context),
            patients: Patients::new(&context),
            family: Family::new(&context),
        }
    }
}

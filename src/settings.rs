use std::{env, path::PathBuf};

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use sara_care::CareConfig;

/// Everything sara reads from the environment at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    /// Postgres connection string, the in-memory store is used when absent
    pub database_url: Option<String>,
    pub port: u16,
    pub upload_dir: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => bail!("JWT_SECRET must be set"),
        };

        let jwt_expire_minutes = match env::var("JWT_EXPIRE_MINUTES") {
            Ok(minutes) => minutes
                .parse()
                .context("JWT_EXPIRE_MINUTES must be a number")?,
            Err(_) => CareConfig::DEFAULT_TOKEN_LIFETIME_IN_MINUTES,
        };

        let port = match env::var("SARA_SERVER_PORT") {
            Ok(port) => port.parse().context("SARA_SERVER_PORT must be a port number")?,
            Err(_) => sara_server::DEFAULT_PORT,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let upload_dir = env::var("SARA_UPLOAD_DIR")
            .unwrap_or_else(|_| CareConfig::DEFAULT_UPLOAD_DIR.to_string())
            .into();

        Ok(Self {
            jwt_secret,
            jwt_expire_minutes,
            database_url,
            port,
            upload_dir,
        })
    }

    pub fn care_config(&self) -> CareConfig {
        CareConfig {
            token_lifetime: chrono::Duration::minutes(self.jwt_expire_minutes),
            upload_dir: self.upload_dir.clone(),
            ..CareConfig::new(self.jwt_secret.clone())
        }
    }
}

#[cfg(test)]
mod test {
    use super::Settings;

    #[test]
    fn care_config_carries_token_settings() {
        let settings = Settings {
            jwt_secret: "secret".to_string(),
            jwt_expire_minutes: 15,
            database_url: None,
            port: 8000,
            upload_dir: "uploads".into(),
        };

        let config = settings.care_config();

        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.token_lifetime, chrono::Duration::minutes(15));
        assert_eq!(config.upload_dir, std::path::PathBuf::from("uploads"));
    }
}

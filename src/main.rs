use std::sync::Arc;

use colored::Colorize;
use log::{error, info, warn};
use sara_care::{Care, DatabaseError, MemoryDatabase, PgDatabase};
use settings::Settings;
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod logging;
mod settings;

pub struct Sara {
    care: Arc<Care>,
    port: u16,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum SaraError {
    #[error("Could not load settings: {0:#}")]
    Settings(#[from] anyhow::Error),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Sara {
    fn new() -> Result<Self, SaraError> {
        let settings = Settings::load()?;

        info!("Building async runtime...");
        let main_runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("sara-async")
            .build()
            .map_err(|e| SaraError::Fatal(e.to_string()))?;

        let config = settings.care_config();

        let care = match &settings.database_url {
            Some(url) => {
                info!("Connecting to database...");
                let database = main_runtime.block_on(async {
                    let database = PgDatabase::new(url).await?;
                    database.migrate().await?;

                    Ok::<_, DatabaseError>(database)
                })?;

                Care::new(database, config)
            }
            None => {
                warn!("DATABASE_URL is not set, data will only be kept in memory.");
                Care::new(MemoryDatabase::new(), config)
            }
        };

        Ok(Self {
            care: Arc::new(care),
            port: settings.port,
            runtime: main_runtime,
        })
    }

    fn run(&self) -> Result<(), SaraError> {
        self.runtime
            .block_on(sara_server::run_server(self.care.clone(), self.port))
            .map_err(|e| SaraError::Fatal(e.to_string()))
    }
}

impl SaraError {
    fn hint(&self) -> String {
        match self {
            SaraError::Settings(_) => "Check the environment or the .env file. JWT_SECRET must be set, and numeric settings must be valid numbers.".to_string(),
            SaraError::Database(_) => "This is a database error. Make sure DATABASE_URL points to a running Postgres instance, then try again.".to_string(),
            SaraError::Logger(_) => "A logger was already installed, this should not happen.".to_string(),
            SaraError::Fatal(_) => "This error is fatal. If the port is already in use, set SARA_SERVER_PORT to another one.".to_string(),
        }
    }
}

fn report(error: SaraError) {
    error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "Sara failed to start!".bold().red());
    error!("{}", error);
    error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
}

fn main() {
    // The log level may come from .env as well
    dotenvy::dotenv().ok();

    if let Err(error) = logging::init_logger(logging::level_from_env()) {
        eprintln!("{}", SaraError::from(error));
        return;
    }

    match Sara::new() {
        Ok(sara) => {
            info!("Initialized successfully.");

            if let Err(error) = sara.run() {
                report(error);
            }
        }
        Err(error) => report(error),
    }
}

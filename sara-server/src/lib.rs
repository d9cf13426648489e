mod auth;
mod context;
mod devices;
mod docs;
mod errors;
mod family;
mod locations;
mod logs;
mod moods;
mod patients;
mod reminders;
mod schemas;
mod serialized;
mod vitals;

use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::{routing::get, Json};
use sara_care::Care;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use auth::DEVICE_TOKEN_HEADER;
pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 8000;

pub type Router = axum::Router<ServerContext>;

/// Builds the application with every route mounted
pub fn app(care: Arc<Care>) -> axum::Router {
    let context = ServerContext { care };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/patients", patients::router())
        .nest("/locations", locations::router())
        .nest("/vitals", vitals::router())
        .nest("/reminders", reminders::router())
        .nest("/sos", locations::sos_router())
        .nest("/devices", devices::router())
        .nest("/moods", moods::router())
        .nest("/comfort", family::comfort_router())
        .nest("/family", family::router())
        .nest("/logs", logs::router());

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the sara server
pub async fn run_server(care: Arc<Care>, port: u16) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await?;

    log::info!("Listening on {}", addr);

    axum::serve(listener, app(care).into_make_service()).await
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, body = serialized::Health)
    )
)]
async fn health() -> Json<serialized::Health> {
    Json(serialized::Health::ok())
}

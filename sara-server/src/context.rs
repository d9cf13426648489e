use std::sync::Arc;

use axum::extract::FromRef;
use sara_care::Care;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub care: Arc<Care>,
}

//! Route-Definitionen (/api/crypto/..., /api/auth/me)

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, ApiState};

pub fn api_router() -> Router<ApiState> {
    Router::new()
        .route("/api/crypto/register-key", post(handlers::register_key))
        .route("/api/crypto/group-key", get(handlers::group_key))
        .route("/api/auth/me", get(handlers::ich))
}

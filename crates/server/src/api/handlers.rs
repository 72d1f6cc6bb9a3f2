use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use musicreq_core::SanitizedConfig;

use super::middleware::AuthUser;
use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub username: String,
}

/// POST /api/v1/login
///
/// The auth middleware has already checked the credentials; this just echoes
/// who they belong to so the frontend can remember them.
pub async fn login(AuthUser(username): AuthUser) -> Json<LoginResponse> {
    Json(LoginResponse { ok: true, username })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

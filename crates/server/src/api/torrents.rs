//! Download client API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use musicreq_core::{metrics, AddTorrentRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::middleware::AuthUser;
use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTorrentBody {
    pub magnet: String,
}

#[derive(Debug, Serialize)]
pub struct AddTorrentResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// POST /api/v1/torrents
///
/// Hand a magnet to the download client under the configured category.
pub async fn add_torrent(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<AddTorrentBody>,
) -> Result<Json<AddTorrentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let magnet = body.magnet.trim();
    if !magnet.starts_with("magnet:") {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid magnet link")),
        ));
    }

    let client = match state.torrent_client() {
        Some(c) => c,
        None => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Torrent client not configured")),
            ))
        }
    };

    match client.add_torrent(AddTorrentRequest::magnet(magnet)).await {
        Ok(result) => {
            metrics::TORRENTS_ADDED.with_label_values(&["success"]).inc();
            info!(user = %user, hash = %result.hash, client = client.name(), "Torrent added");
            Ok(Json(AddTorrentResponse {
                ok: true,
                hash: Some(result.hash).filter(|h| !h.is_empty()),
            }))
        }
        Err(e) => {
            metrics::TORRENTS_ADDED.with_label_values(&["failed"]).inc();
            error!(user = %user, error = %e, "Failed to add torrent");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Failed to add torrent: {}", e))),
            ))
        }
    }
}

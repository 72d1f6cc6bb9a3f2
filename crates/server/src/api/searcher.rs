//! Search API handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use musicreq_core::NormalizedResult;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::middleware::AuthUser;
use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<NormalizedResult>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// GET /api/v1/search?q=...
///
/// Queries every configured source, merges the results in priority order and
/// flags the ones already in the download client.
pub async fn search(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Query required")),
        ));
    }

    let search = state.aggregator().search_with_stats(query);
    let outcome = match state.search_deadline() {
        Some(deadline) => match tokio::time::timeout(deadline, search).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(query = %query, deadline_secs = deadline.as_secs(), "Search deadline elapsed");
                return Err((
                    StatusCode::GATEWAY_TIMEOUT,
                    Json(ErrorResponse::new("Search took too long, try again later")),
                ));
            }
        },
        None => search.await,
    };

    match outcome {
        Ok((results, stats)) => {
            info!(
                user = %user,
                query = %query,
                returned = stats.returned,
                duration_ms = stats.duration_ms,
                "Search served"
            );
            Ok(Json(SearchResponse { results }))
        }
        Err(e) => {
            error!(query = %query, error = %e, "Search failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Search failed, try again later")),
            ))
        }
    }
}

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod searcher;
pub mod torrents;

pub use routes::create_router;

use serde::Serialize;

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

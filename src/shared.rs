use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::room::repository::RoomRepository;
use crate::search::MovieLookup;
use crate::session::SessionCoordinator;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub coordinator: Arc<SessionCoordinator>,
    pub movie_lookup: Arc<dyn MovieLookup>,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        connection_manager: Arc<dyn ConnectionManager>,
        coordinator: Arc<SessionCoordinator>,
        movie_lookup: Arc<dyn MovieLookup>,
    ) -> Self {
        Self {
            room_repository,
            connection_manager,
            coordinator,
            movie_lookup,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// The caller is not in a room, or the room no longer exists
    #[error("Room not found")]
    RoomNotFound,

    /// A vote, veto or candidate change broke a room rule
    #[error("{0}")]
    InvalidOperation(String),

    /// Spin requested with nothing eligible on the wheel
    #[error("No movies in wheel")]
    EmptyWheel,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidOperation(_) | AppError::EmptyWheel | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::RoomService,
    types::{RoomCreateRequest, RoomResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /api/rooms/create
/// Body is optional; `{"name": "..."}` sets the room name
#[instrument(name = "create_room", skip(state, request))]
pub async fn create_room(
    State(state): State<AppState>,
    request: Option<Json<RoomCreateRequest>>,
) -> Result<Json<RoomResponse>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.create_room(request)?;

    Ok(Json(room))
}

/// HTTP handler for looking up a room by code
///
/// GET /api/rooms/:code
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.get_room_details(&code)?;

    info!(
        room_code = %room.code,
        participant_count = room.participants.len(),
        "Room fetched"
    );
    Ok(Json(room))
}

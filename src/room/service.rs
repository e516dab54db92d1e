use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    repository::RoomRepository,
    types::{RoomCreateRequest, RoomResponse},
};
use crate::shared::AppError;

/// Service for the HTTP side of rooms. Live membership goes through the
/// session coordinator instead.
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// Creates an empty room; whoever asked joins it over the socket
    #[instrument(skip(self))]
    pub fn create_room(&self, request: RoomCreateRequest) -> Result<RoomResponse, AppError> {
        let room = self.repository.create_room(request.name)?;
        debug!(room_code = %room.code, "Generated room code");

        info!(
            room_code = %room.code,
            room_name = %room.name,
            "Room created successfully"
        );
        Ok(RoomResponse::from(room))
    }

    /// Gets room details as a response object for API endpoints
    #[instrument(skip(self))]
    pub fn get_room_details(&self, code: &str) -> Result<RoomResponse, AppError> {
        let room = self.repository.get_room(code)?;
        Ok(RoomResponse::from(room))
    }
}

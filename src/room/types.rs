use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Candidate, Participant, RoomModel};

/// Request payload for creating a new room
#[derive(Debug, Default, Deserialize)]
pub struct RoomCreateRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Public view of a room for the HTTP endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    pub candidates: Vec<Candidate>,
    pub shared_audio: Option<String>,
}

impl From<RoomModel> for RoomResponse {
    fn from(room: RoomModel) -> Self {
        Self {
            code: room.code,
            name: room.name,
            created_at: room.created_at,
            participants: room.participants,
            candidates: room.candidates,
            shared_audio: room.shared_audio,
        }
    }
}

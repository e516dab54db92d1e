use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::room::models::{
    Candidate, CandidateId, ConnectionId, NewCandidate, Participant, RoomModel, SpinRecord,
    VoteDirection,
};
use crate::session::SpinProgress;
use crate::shared::AppError;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    AddCandidate,
    RemoveCandidate,
    StartSpin,
    VoteCandidate,
    VetoCandidate,
    UpdateSharedAudio,

    // Server -> Client
    RoomSnapshot,
    ParticipantJoined,
    ParticipantLeft,
    CandidateAdded,
    CandidateRemoved,
    VoteUpdated,
    VetoApplied,
    EliminationStarted,
    SpinStarted,
    EliminationRoundComplete,
    SpinStopped,
    SharedAudioUpdated,
    OperationFailed,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomPayload {
    #[serde(default)]
    pub name: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCandidatePayload {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSpinPayload {
    /// Seconds
    pub duration: f64,
    #[serde(default)]
    pub elimination_rounds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotePayload {
    pub candidate_id: CandidateId,
    pub direction: VoteDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VetoPayload {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedAudioPayload {
    #[serde(default)]
    pub url: Option<String>,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshotPayload {
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    pub candidates: Vec<Candidate>,
    pub votes: HashMap<CandidateId, HashMap<ConnectionId, VoteDirection>>,
    pub vetoes: HashMap<ConnectionId, bool>,
    pub wheel_rotation: f64,
    pub elimination_round: u32,
    pub shared_audio: Option<String>,
    pub current_spin: Option<SpinRecord>,
}

impl From<&RoomModel> for RoomSnapshotPayload {
    fn from(room: &RoomModel) -> Self {
        Self {
            code: room.code.clone(),
            name: room.name.clone(),
            created_at: room.created_at,
            participants: room.participants.clone(),
            candidates: room.candidates.clone(),
            votes: room.votes.clone(),
            vetoes: room.vetoes.clone(),
            wheel_rotation: room.wheel_rotation,
            elimination_round: room.elimination_round(),
            shared_audio: room.shared_audio.clone(),
            current_spin: room.current_spin.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantPayload {
    pub participant: Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAddedPayload {
    pub candidate: Candidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRemovedPayload {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteUpdatedPayload {
    pub candidate_id: CandidateId,
    pub votes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VetoAppliedPayload {
    pub candidate_id: CandidateId,
    pub vetoed_by: String,
    pub vetoes: HashMap<ConnectionId, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EliminationStartedPayload {
    pub total_rounds: u32,
    pub started_by: String,
    pub available_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinStartedPayload {
    #[serde(flatten)]
    pub spin: SpinRecord,
    /// Set when replaying a running spin to someone who just joined
    pub sync_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EliminationRoundCompletePayload {
    pub candidate_id: CandidateId,
    pub title: String,
    pub current_round: u32,
    pub total_rounds: u32,
    pub remaining_candidates: usize,
    pub eliminated: Vec<CandidateId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinStoppedPayload {
    pub winner: Candidate,
    pub spun_by: String,
    /// True when the winner was left standing without a final spin
    pub outright: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedAudioUpdatedPayload {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationFailedPayload {
    pub message: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    fn with_payload<P: Serialize>(message_type: MessageType, payload: P) -> Self {
        Self::new(
            message_type,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Decodes the payload of an inbound message
    pub fn parse_payload<P: DeserializeOwned>(&self) -> Result<P, AppError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            AppError::BadRequest(format!("Invalid {:?} payload: {}", self.message_type, e))
        })
    }

    /// Create a CREATE_ROOM message
    pub fn create_room(name: Option<String>, display_name: String) -> Self {
        Self::with_payload(
            MessageType::CreateRoom,
            CreateRoomPayload { name, display_name },
        )
    }

    /// Create a JOIN_ROOM message
    pub fn join_room(code: String, display_name: String) -> Self {
        Self::with_payload(MessageType::JoinRoom, JoinRoomPayload { code, display_name })
    }

    /// Create a LEAVE_ROOM message
    pub fn leave_room() -> Self {
        Self::new(MessageType::LeaveRoom, serde_json::json!({}))
    }

    /// Create an ADD_CANDIDATE message
    pub fn add_candidate(candidate: NewCandidate) -> Self {
        Self::with_payload(MessageType::AddCandidate, candidate)
    }

    /// Create a REMOVE_CANDIDATE message
    pub fn remove_candidate(candidate_id: CandidateId) -> Self {
        Self::with_payload(
            MessageType::RemoveCandidate,
            RemoveCandidatePayload { candidate_id },
        )
    }

    /// Create a START_SPIN message
    pub fn start_spin(duration: f64, elimination_rounds: u32) -> Self {
        Self::with_payload(
            MessageType::StartSpin,
            StartSpinPayload {
                duration,
                elimination_rounds,
            },
        )
    }

    /// Create a VOTE_CANDIDATE message
    pub fn vote_candidate(candidate_id: CandidateId, direction: VoteDirection) -> Self {
        Self::with_payload(
            MessageType::VoteCandidate,
            VotePayload {
                candidate_id,
                direction,
            },
        )
    }

    /// Create a VETO_CANDIDATE message
    pub fn veto_candidate(candidate_id: CandidateId) -> Self {
        Self::with_payload(MessageType::VetoCandidate, VetoPayload { candidate_id })
    }

    /// Create an UPDATE_SHARED_AUDIO message
    pub fn update_shared_audio(url: Option<String>) -> Self {
        Self::with_payload(MessageType::UpdateSharedAudio, SharedAudioPayload { url })
    }

    /// Create a ROOM_SNAPSHOT message
    pub fn room_snapshot(room: &RoomModel) -> Self {
        Self::with_payload(MessageType::RoomSnapshot, RoomSnapshotPayload::from(room))
    }

    /// Create a PARTICIPANT_JOINED message
    pub fn participant_joined(participant: Participant) -> Self {
        Self::with_payload(
            MessageType::ParticipantJoined,
            ParticipantPayload { participant },
        )
    }

    /// Create a PARTICIPANT_LEFT message
    pub fn participant_left(participant: Participant) -> Self {
        Self::with_payload(
            MessageType::ParticipantLeft,
            ParticipantPayload { participant },
        )
    }

    /// Create a CANDIDATE_ADDED message
    pub fn candidate_added(candidate: Candidate) -> Self {
        Self::with_payload(
            MessageType::CandidateAdded,
            CandidateAddedPayload { candidate },
        )
    }

    /// Create a CANDIDATE_REMOVED message
    pub fn candidate_removed(candidate_id: CandidateId) -> Self {
        Self::with_payload(
            MessageType::CandidateRemoved,
            CandidateRemovedPayload { candidate_id },
        )
    }

    /// Create a VOTE_UPDATED message
    pub fn vote_updated(candidate_id: CandidateId, votes: i32) -> Self {
        Self::with_payload(
            MessageType::VoteUpdated,
            VoteUpdatedPayload {
                candidate_id,
                votes,
            },
        )
    }

    /// Create a VETO_APPLIED message
    pub fn veto_applied(
        candidate_id: CandidateId,
        vetoed_by: String,
        vetoes: HashMap<ConnectionId, bool>,
    ) -> Self {
        Self::with_payload(
            MessageType::VetoApplied,
            VetoAppliedPayload {
                candidate_id,
                vetoed_by,
                vetoes,
            },
        )
    }

    /// Create an ELIMINATION_STARTED message
    pub fn elimination_started(
        total_rounds: u32,
        started_by: String,
        available_candidates: usize,
    ) -> Self {
        Self::with_payload(
            MessageType::EliminationStarted,
            EliminationStartedPayload {
                total_rounds,
                started_by,
                available_candidates,
            },
        )
    }

    /// Create a SPIN_STARTED message for everyone in the room
    pub fn spin_started(spin: SpinRecord) -> Self {
        Self::with_payload(
            MessageType::SpinStarted,
            SpinStartedPayload {
                spin,
                sync_mode: false,
                elapsed_ms: None,
                remaining_ms: None,
            },
        )
    }

    /// Create a SPIN_STARTED message replaying a running spin for a late joiner
    pub fn spin_sync(spin: SpinRecord, progress: SpinProgress) -> Self {
        Self::with_payload(
            MessageType::SpinStarted,
            SpinStartedPayload {
                spin,
                sync_mode: true,
                elapsed_ms: Some(progress.elapsed_ms),
                remaining_ms: Some(progress.remaining_ms),
            },
        )
    }

    /// Create an ELIMINATION_ROUND_COMPLETE message
    pub fn elimination_round_complete(payload: EliminationRoundCompletePayload) -> Self {
        Self::with_payload(MessageType::EliminationRoundComplete, payload)
    }

    /// Create a SPIN_STOPPED message
    pub fn spin_stopped(winner: Candidate, spun_by: String, outright: bool) -> Self {
        Self::with_payload(
            MessageType::SpinStopped,
            SpinStoppedPayload {
                winner,
                spun_by,
                outright,
            },
        )
    }

    /// Create a SHARED_AUDIO_UPDATED message
    pub fn shared_audio_updated(url: Option<String>) -> Self {
        Self::with_payload(
            MessageType::SharedAudioUpdated,
            SharedAudioUpdatedPayload { url },
        )
    }

    /// Create an OPERATION_FAILED message
    pub fn operation_failed(message: String) -> Self {
        Self::with_payload(
            MessageType::OperationFailed,
            OperationFailedPayload { message },
        )
    }
}

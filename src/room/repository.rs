use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::models::{
    Candidate, CandidateId, ConnectionId, EliminationState, Participant, RoomModel, SpinRecord,
    VoteDirection,
};
use crate::shared::AppError;

/// Number of distinct four digit codes
const ROOM_CODE_SPACE: usize = 9000;

/// Result of removing a connection from its room
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    /// Participant left, other participants remain
    Left {
        room: RoomModel,
        participant: Participant,
    },
    /// Participant was the last one, the room is gone
    RoomDeleted {
        code: String,
        participant: Participant,
    },
    /// Connection was not in any room
    NotInRoom,
}

/// Outcome of a completed elimination spin
#[derive(Debug, Clone)]
pub struct EliminationRecord {
    pub state: EliminationState,
    pub remaining_candidates: usize,
}

/// Storage for live rooms.
///
/// Every method is synchronous and applies its change as a single step, so a
/// caller never observes a half-applied update.
pub trait RoomRepository: Send + Sync {
    /// Creates an empty room under a fresh code not used by any live room
    fn create_room(&self, name: Option<String>) -> Result<RoomModel, AppError>;
    fn get_room(&self, code: &str) -> Result<RoomModel, AppError>;
    fn room_count(&self) -> usize;

    /// Codes of rooms nobody has joined within `older_than` of their creation
    fn get_unjoined_rooms(&self, older_than: Duration) -> Vec<String>;

    /// Deletes the room only if its roster is still empty
    fn delete_room_if_empty(&self, code: &str) -> Result<bool, AppError>;

    /// Code of the room a connection currently belongs to
    fn room_code_for(&self, connection_id: &str) -> Option<String>;

    /// Adds a participant and returns the room as they will see it
    fn join_room(&self, code: &str, participant: Participant) -> Result<RoomModel, AppError>;

    /// Removes a connection from its room, deleting the room once it is empty
    fn leave_room(&self, connection_id: &str) -> LeaveRoomResult;

    fn add_candidate(&self, code: &str, candidate: Candidate) -> Result<Candidate, AppError>;
    fn remove_candidate(&self, code: &str, candidate_id: CandidateId) -> Result<(), AppError>;

    /// Applies a vote and returns the candidate's new tally
    fn cast_vote(
        &self,
        code: &str,
        connection_id: &str,
        candidate_id: CandidateId,
        direction: VoteDirection,
    ) -> Result<i32, AppError>;

    /// Applies a veto and returns the updated veto ledger
    fn apply_veto(
        &self,
        code: &str,
        connection_id: &str,
        candidate_id: CandidateId,
    ) -> Result<HashMap<ConnectionId, bool>, AppError>;

    fn wheel_rotation(&self, code: &str) -> Result<f64, AppError>;
    fn current_spin(&self, code: &str) -> Result<Option<SpinRecord>, AppError>;

    /// Stores the spin, replacing whatever spin was running
    fn set_current_spin(&self, code: &str, spin: Option<SpinRecord>) -> Result<(), AppError>;

    /// Clears the current spin if it still carries `token` and folds its
    /// rotation into the wheel. Returns `None` when the spin was superseded.
    fn complete_spin(&self, code: &str, token: &str) -> Result<Option<SpinRecord>, AppError>;

    fn elimination_state(&self, code: &str) -> Result<Option<EliminationState>, AppError>;
    fn set_elimination_state(
        &self,
        code: &str,
        state: Option<EliminationState>,
    ) -> Result<(), AppError>;

    /// Moves the given sequence to its next round. Returns `None` when that
    /// sequence is no longer the room's current one.
    fn advance_elimination(
        &self,
        code: &str,
        sequence: &str,
    ) -> Result<Option<EliminationState>, AppError>;

    /// Clears the elimination state if it still belongs to `sequence`
    fn end_elimination(&self, code: &str, sequence: &str) -> Result<(), AppError>;

    /// Marks a candidate eliminated within the given sequence. Returns `None`
    /// when that sequence is no longer the room's current one.
    fn record_elimination(
        &self,
        code: &str,
        sequence: &str,
        candidate_id: CandidateId,
    ) -> Result<Option<EliminationRecord>, AppError>;

    /// Clears elimination flags on every candidate
    fn reset_eliminations(&self, code: &str) -> Result<(), AppError>;

    fn set_shared_audio(&self, code: &str, url: Option<String>) -> Result<(), AppError>;
}

#[derive(Default)]
struct Rooms {
    by_code: HashMap<String, RoomModel>,
    /// connection -> room code
    memberships: HashMap<ConnectionId, String>,
    /// Creation instants of rooms nobody has joined yet
    unjoined_since: HashMap<String, Instant>,
}

/// In-memory implementation of RoomRepository
pub struct InMemoryRoomRepository {
    rooms: Mutex<Rooms>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(Rooms::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rooms>, AppError> {
        self.rooms.lock().map_err(|_| AppError::Internal)
    }

    /// Runs `f` against a live room while holding the lock
    fn with_room<T>(
        &self,
        code: &str,
        f: impl FnOnce(&mut RoomModel) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut rooms = self.lock()?;
        let room = rooms.by_code.get_mut(code).ok_or(AppError::RoomNotFound)?;
        f(room)
    }
}

fn generate_room_code() -> String {
    rand::random_range(1000..10000).to_string()
}

impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    fn create_room(&self, name: Option<String>) -> Result<RoomModel, AppError> {
        let mut rooms = self.lock()?;
        if rooms.by_code.len() >= ROOM_CODE_SPACE {
            warn!("Every room code is in use");
            return Err(AppError::Internal);
        }

        let mut code = generate_room_code();
        while rooms.by_code.contains_key(&code) {
            debug!(room_code = %code, "Room code collision, regenerating");
            code = generate_room_code();
        }

        let room = RoomModel::new(code.clone(), name);
        rooms.by_code.insert(code.clone(), room.clone());
        rooms.unjoined_since.insert(code.clone(), Instant::now());

        info!(room_code = %code, room_name = %room.name, "Room created in memory");
        Ok(room)
    }

    #[instrument(skip(self))]
    fn get_room(&self, code: &str) -> Result<RoomModel, AppError> {
        let rooms = self.lock()?;
        match rooms.by_code.get(code) {
            Some(room) => Ok(room.clone()),
            None => {
                debug!(room_code = %code, "Room not found in memory");
                Err(AppError::RoomNotFound)
            }
        }
    }

    fn room_count(&self) -> usize {
        self.lock().map(|rooms| rooms.by_code.len()).unwrap_or(0)
    }

    fn get_unjoined_rooms(&self, older_than: Duration) -> Vec<String> {
        let Ok(rooms) = self.lock() else {
            return Vec::new();
        };
        rooms
            .unjoined_since
            .iter()
            .filter(|(_, created)| created.elapsed() >= older_than)
            .map(|(code, _)| code.clone())
            .collect()
    }

    #[instrument(skip(self))]
    fn delete_room_if_empty(&self, code: &str) -> Result<bool, AppError> {
        let mut rooms = self.lock()?;
        let room = rooms.by_code.get(code).ok_or(AppError::RoomNotFound)?;
        if !room.participants.is_empty() {
            debug!(room_code = %code, "Room has participants, keeping it");
            return Ok(false);
        }

        rooms.by_code.remove(code);
        rooms.unjoined_since.remove(code);
        info!(room_code = %code, "Unjoined room deleted");
        Ok(true)
    }

    fn room_code_for(&self, connection_id: &str) -> Option<String> {
        let rooms = self.lock().ok()?;
        rooms.memberships.get(connection_id).cloned()
    }

    #[instrument(skip(self, participant), fields(connection_id = %participant.id))]
    fn join_room(&self, code: &str, participant: Participant) -> Result<RoomModel, AppError> {
        let mut rooms = self.lock()?;
        let Rooms {
            by_code,
            memberships,
            unjoined_since,
        } = &mut *rooms;

        let room = by_code.get_mut(code).ok_or(AppError::RoomNotFound)?;
        let connection_id = participant.id.clone();
        room.add_participant(participant);
        memberships.insert(connection_id, code.to_string());
        unjoined_since.remove(code);

        info!(
            room_code = %code,
            participant_count = room.participant_count(),
            "Participant joined room"
        );
        Ok(room.clone())
    }

    #[instrument(skip(self))]
    fn leave_room(&self, connection_id: &str) -> LeaveRoomResult {
        let Ok(mut rooms) = self.lock() else {
            return LeaveRoomResult::NotInRoom;
        };

        let Some(code) = rooms.memberships.remove(connection_id) else {
            debug!("Connection not in any room");
            return LeaveRoomResult::NotInRoom;
        };

        let Some(room) = rooms.by_code.get_mut(&code) else {
            warn!(room_code = %code, "Membership pointed at a missing room");
            return LeaveRoomResult::NotInRoom;
        };

        let Some(participant) = room.remove_participant(connection_id) else {
            return LeaveRoomResult::NotInRoom;
        };

        if room.participants.is_empty() {
            rooms.by_code.remove(&code);
            info!(room_code = %code, "Room is now empty, deleting");
            return LeaveRoomResult::RoomDeleted { code, participant };
        }

        info!(
            room_code = %code,
            participant_count = room.participant_count(),
            "Participant left room"
        );
        LeaveRoomResult::Left {
            room: room.clone(),
            participant,
        }
    }

    fn add_candidate(&self, code: &str, candidate: Candidate) -> Result<Candidate, AppError> {
        self.with_room(code, |room| {
            room.add_candidate(candidate.clone());
            debug!(room_code = %code, candidate_id = candidate.id, "Candidate added");
            Ok(candidate)
        })
    }

    fn remove_candidate(&self, code: &str, candidate_id: CandidateId) -> Result<(), AppError> {
        self.with_room(code, |room| room.remove_candidate(candidate_id))
    }

    fn cast_vote(
        &self,
        code: &str,
        connection_id: &str,
        candidate_id: CandidateId,
        direction: VoteDirection,
    ) -> Result<i32, AppError> {
        self.with_room(code, |room| {
            room.apply_vote(connection_id, candidate_id, direction)
        })
    }

    fn apply_veto(
        &self,
        code: &str,
        connection_id: &str,
        candidate_id: CandidateId,
    ) -> Result<HashMap<ConnectionId, bool>, AppError> {
        self.with_room(code, |room| {
            room.apply_veto(connection_id, candidate_id)?;
            Ok(room.vetoes.clone())
        })
    }

    fn wheel_rotation(&self, code: &str) -> Result<f64, AppError> {
        self.with_room(code, |room| Ok(room.wheel_rotation))
    }

    fn current_spin(&self, code: &str) -> Result<Option<SpinRecord>, AppError> {
        self.with_room(code, |room| Ok(room.current_spin.clone()))
    }

    fn set_current_spin(&self, code: &str, spin: Option<SpinRecord>) -> Result<(), AppError> {
        self.with_room(code, |room| {
            room.current_spin = spin;
            Ok(())
        })
    }

    fn complete_spin(&self, code: &str, token: &str) -> Result<Option<SpinRecord>, AppError> {
        self.with_room(code, |room| {
            let is_current = room
                .current_spin
                .as_ref()
                .is_some_and(|spin| spin.token == token);
            if !is_current {
                return Ok(None);
            }

            let spin = room.current_spin.take();
            if let Some(spin) = &spin {
                room.fold_rotation(spin.total_rotation);
            }
            Ok(spin)
        })
    }

    fn elimination_state(&self, code: &str) -> Result<Option<EliminationState>, AppError> {
        self.with_room(code, |room| Ok(room.elimination.clone()))
    }

    fn set_elimination_state(
        &self,
        code: &str,
        state: Option<EliminationState>,
    ) -> Result<(), AppError> {
        self.with_room(code, |room| {
            room.elimination = state;
            Ok(())
        })
    }

    fn advance_elimination(
        &self,
        code: &str,
        sequence: &str,
    ) -> Result<Option<EliminationState>, AppError> {
        self.with_room(code, |room| {
            let state = room
                .elimination
                .as_mut()
                .filter(|state| state.sequence == sequence)
                .map(|state| {
                    state.current_round += 1;
                    state.clone()
                });
            Ok(state)
        })
    }

    fn end_elimination(&self, code: &str, sequence: &str) -> Result<(), AppError> {
        self.with_room(code, |room| {
            if room
                .elimination
                .as_ref()
                .is_some_and(|state| state.sequence == sequence)
            {
                room.elimination = None;
            }
            Ok(())
        })
    }

    fn record_elimination(
        &self,
        code: &str,
        sequence: &str,
        candidate_id: CandidateId,
    ) -> Result<Option<EliminationRecord>, AppError> {
        self.with_room(code, |room| {
            let Some(state) = room
                .elimination
                .as_mut()
                .filter(|state| state.sequence == sequence)
            else {
                return Ok(None);
            };

            if !state.eliminated.contains(&candidate_id) {
                state.eliminated.push(candidate_id);
            }
            let state = state.clone();
            room.mark_eliminated(candidate_id);

            Ok(Some(EliminationRecord {
                state,
                remaining_candidates: room.eligible_candidates().len(),
            }))
        })
    }

    fn reset_eliminations(&self, code: &str) -> Result<(), AppError> {
        self.with_room(code, |room| {
            room.reset_eliminations();
            Ok(())
        })
    }

    fn set_shared_audio(&self, code: &str, url: Option<String>) -> Result<(), AppError> {
        self.with_room(code, |room| {
            room.shared_audio = url;
            Ok(())
        })
    }
}

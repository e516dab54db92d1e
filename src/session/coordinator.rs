use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::elimination::SpinPhase;
use super::sync::spin_progress;
use crate::{
    room::{
        models::{Candidate, CandidateId, NewCandidate, Participant, RoomModel, RoundInfo, SpinRecord, VoteDirection},
        repository::{LeaveRoomResult, RoomRepository},
    },
    shared::AppError,
    wheel::{random_rotation, select_winner, SpinMagnitude, FULL_SPIN},
    websockets::{ConnectionManager, WebSocketMessage},
};

/// Longest spin a client may request, in seconds
pub const MAX_SPIN_DURATION_SECS: f64 = 60.0;

/// Timer settings for spin completion and elimination pacing
#[derive(Debug, Clone)]
pub struct SpinTiming {
    /// Added to the spin duration before the result is announced, to absorb
    /// client timer drift
    pub completion_buffer: Duration,
    /// Pause between an elimination and the next round's spin
    pub elimination_pacing: Duration,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            completion_buffer: Duration::from_secs(1),
            elimination_pacing: Duration::from_secs(2),
        }
    }
}

/// Owns the rules of a room session: who is in it, what is on the wheel,
/// and how spins play out. All outbound traffic goes through here.
pub struct SessionCoordinator {
    pub(super) repository: Arc<dyn RoomRepository>,
    connection_manager: Arc<dyn ConnectionManager>,
    pub(super) timing: SpinTiming,
    rng: Mutex<StdRng>,
}

impl SessionCoordinator {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        connection_manager: Arc<dyn ConnectionManager>,
        timing: SpinTiming,
    ) -> Self {
        Self {
            repository,
            connection_manager,
            timing,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Makes spin rotations reproducible
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn room_code_of(&self, connection_id: &str) -> Result<String, AppError> {
        self.repository
            .room_code_for(connection_id)
            .ok_or(AppError::RoomNotFound)
    }

    fn serialize(message: &WebSocketMessage) -> Option<String> {
        match serde_json::to_string(message) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, message_type = ?message.message_type, "Failed to serialize message");
                None
            }
        }
    }

    async fn send_to(&self, connection_id: &str, message: &WebSocketMessage) {
        if let Some(json) = Self::serialize(message) {
            self.connection_manager
                .send_to_connection(connection_id, &json)
                .await;
        }
    }

    /// Sends a message to every participant of a live room
    pub(super) async fn broadcast(&self, code: &str, message: &WebSocketMessage) {
        self.broadcast_filtered(code, None, message).await;
    }

    async fn broadcast_except(&self, code: &str, except: &str, message: &WebSocketMessage) {
        self.broadcast_filtered(code, Some(except), message).await;
    }

    async fn broadcast_filtered(
        &self,
        code: &str,
        except: Option<&str>,
        message: &WebSocketMessage,
    ) {
        let room = match self.repository.get_room(code) {
            Ok(room) => room,
            Err(_) => {
                debug!(room_code = %code, "Room gone, nothing to broadcast");
                return;
            }
        };
        let Some(json) = Self::serialize(message) else {
            return;
        };

        let recipients: Vec<String> = room
            .participant_ids()
            .into_iter()
            .filter(|id| Some(id.as_str()) != except)
            .collect();
        self.connection_manager
            .send_to_connections(&recipients, &json)
            .await;

        debug!(
            room_code = %code,
            message_type = ?message.message_type,
            recipients = recipients.len(),
            "Broadcast sent"
        );
    }

    /// Tells the requester (and only the requester) that their request failed
    pub async fn report_failure(&self, connection_id: &str, error: &AppError) {
        debug!(connection_id = %connection_id, error = %error, "Reporting failed operation");
        self.send_to(connection_id, &WebSocketMessage::operation_failed(error.to_string()))
            .await;
    }

    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        connection_id: &str,
        name: Option<String>,
        display_name: &str,
    ) -> Result<RoomModel, AppError> {
        let display_name = clean_display_name(display_name)?;
        let room = self.repository.create_room(name)?;
        self.join_room(connection_id, &room.code, &display_name)
            .await
    }

    /// Adds the connection to a room, sends it the room snapshot, replays any
    /// spin in flight and announces the newcomer to everyone else
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        connection_id: &str,
        code: &str,
        display_name: &str,
    ) -> Result<RoomModel, AppError> {
        let display_name = clean_display_name(display_name)?;
        let target = self.repository.get_room(code)?;

        match self.repository.room_code_for(connection_id) {
            Some(current) if current == code => {
                debug!(room_code = %code, "Already in room, resending snapshot");
                self.send_snapshot(connection_id, &target).await;
                return Ok(target);
            }
            Some(_) => self.leave_room(connection_id).await?,
            None => {}
        }

        let participant = Participant::new(connection_id.to_string(), display_name);
        let room = self.repository.join_room(code, participant.clone())?;

        self.send_snapshot(connection_id, &room).await;
        self.broadcast_except(
            code,
            connection_id,
            &WebSocketMessage::participant_joined(participant),
        )
        .await;

        info!(
            room_code = %code,
            participant_count = room.participant_count(),
            "Participant joined"
        );
        Ok(room)
    }

    async fn send_snapshot(&self, connection_id: &str, room: &RoomModel) {
        self.send_to(connection_id, &WebSocketMessage::room_snapshot(room))
            .await;

        let Some(spin) = &room.current_spin else {
            return;
        };
        match spin_progress(spin, Utc::now().timestamp_millis()) {
            Some(progress) => {
                debug!(
                    room_code = %room.code,
                    elapsed_ms = progress.elapsed_ms,
                    remaining_ms = progress.remaining_ms,
                    "Syncing late joiner with running spin"
                );
                self.send_to(connection_id, &WebSocketMessage::spin_sync(spin.clone(), progress))
                    .await;
            }
            None => debug!(room_code = %room.code, "Spin nearly over, skipping sync"),
        }
    }

    #[instrument(skip(self))]
    pub async fn leave_room(&self, connection_id: &str) -> Result<(), AppError> {
        match self.repository.leave_room(connection_id) {
            LeaveRoomResult::Left { room, participant } => {
                info!(room_code = %room.code, participant = %participant.name, "Participant left");
                self.broadcast(&room.code, &WebSocketMessage::participant_left(participant))
                    .await;
                Ok(())
            }
            LeaveRoomResult::RoomDeleted { code, participant } => {
                info!(
                    room_code = %code,
                    participant = %participant.name,
                    "Last participant left, room deleted"
                );
                Ok(())
            }
            LeaveRoomResult::NotInRoom => Err(AppError::RoomNotFound),
        }
    }

    /// Socket closed; same as leaving, minus the error when not in a room
    pub async fn disconnect(&self, connection_id: &str) {
        if self.leave_room(connection_id).await.is_err() {
            debug!(connection_id = %connection_id, "Disconnected without a room");
        }
    }

    #[instrument(skip(self, details), fields(title = %details.title))]
    pub async fn add_candidate(
        &self,
        connection_id: &str,
        details: NewCandidate,
    ) -> Result<Candidate, AppError> {
        let code = self.room_code_of(connection_id)?;
        let title = details.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Movie title is required".to_string()));
        }

        let added_by = self.repository.get_room(&code)?.participant_name(connection_id);
        let candidate = Candidate::new(NewCandidate { title, ..details }, added_by);
        let candidate = self.repository.add_candidate(&code, candidate)?;

        info!(room_code = %code, candidate_id = candidate.id, "Movie added");
        self.broadcast(&code, &WebSocketMessage::candidate_added(candidate.clone()))
            .await;
        Ok(candidate)
    }

    #[instrument(skip(self))]
    pub async fn remove_candidate(
        &self,
        connection_id: &str,
        candidate_id: CandidateId,
    ) -> Result<(), AppError> {
        let code = self.room_code_of(connection_id)?;
        self.repository.remove_candidate(&code, candidate_id)?;

        info!(room_code = %code, candidate_id = candidate_id, "Movie removed");
        self.broadcast(&code, &WebSocketMessage::candidate_removed(candidate_id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn vote(
        &self,
        connection_id: &str,
        candidate_id: CandidateId,
        direction: VoteDirection,
    ) -> Result<i32, AppError> {
        let code = self.room_code_of(connection_id)?;
        let votes = self
            .repository
            .cast_vote(&code, connection_id, candidate_id, direction)?;

        debug!(room_code = %code, candidate_id = candidate_id, votes = votes, "Vote recorded");
        self.broadcast(&code, &WebSocketMessage::vote_updated(candidate_id, votes))
            .await;
        Ok(votes)
    }

    #[instrument(skip(self))]
    pub async fn veto(&self, connection_id: &str, candidate_id: CandidateId) -> Result<(), AppError> {
        let code = self.room_code_of(connection_id)?;
        let vetoes = self
            .repository
            .apply_veto(&code, connection_id, candidate_id)?;
        let vetoed_by = self.repository.get_room(&code)?.participant_name(connection_id);

        info!(room_code = %code, candidate_id = candidate_id, vetoed_by = %vetoed_by, "Movie vetoed");
        self.broadcast(
            &code,
            &WebSocketMessage::veto_applied(candidate_id, vetoed_by, vetoes),
        )
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_shared_audio(
        &self,
        connection_id: &str,
        url: Option<String>,
    ) -> Result<(), AppError> {
        let code = self.room_code_of(connection_id)?;
        let url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        self.repository.set_shared_audio(&code, url.clone())?;

        debug!(room_code = %code, "Shared audio updated");
        self.broadcast_except(&code, connection_id, &WebSocketMessage::shared_audio_updated(url))
            .await;
        Ok(())
    }

    /// Starts a spin, or an elimination sequence when `elimination_rounds > 0`.
    ///
    /// Whatever spin or sequence was running in the room is superseded.
    #[instrument(skip(self))]
    pub async fn start_spin(
        self: &Arc<Self>,
        connection_id: &str,
        duration: f64,
        elimination_rounds: u32,
    ) -> Result<(), AppError> {
        if !duration.is_finite() || duration <= 0.0 || duration > MAX_SPIN_DURATION_SECS {
            return Err(AppError::BadRequest(format!(
                "Spin duration must be between 0 and {} seconds",
                MAX_SPIN_DURATION_SECS
            )));
        }

        let code = self.room_code_of(connection_id)?;
        let room = self.repository.get_room(&code)?;
        let spun_by = room.participant_name(connection_id);

        // A new request puts eliminated movies back on the wheel
        let wheel: Vec<Candidate> = room
            .candidates
            .into_iter()
            .filter(|c| !c.vetoed)
            .map(|c| Candidate {
                eliminated: false,
                ..c
            })
            .collect();
        if wheel.is_empty() {
            return Err(AppError::EmptyWheel);
        }

        self.repository.set_current_spin(&code, None)?;
        self.repository.set_elimination_state(&code, None)?;
        self.repository.reset_eliminations(&code)?;

        if elimination_rounds == 0 {
            let spin = self
                .launch_spin(&code, spun_by, duration, wheel, FULL_SPIN, None)
                .await?;
            self.spawn_spin_driver(code, None, SpinPhase::Final(spin));
            return Ok(());
        }

        self.start_elimination(code, spun_by, duration, elimination_rounds, wheel.len())
            .await
    }

    /// Resolves the winner for a new spin, stores it as the room's current
    /// spin and announces it
    pub(super) async fn launch_spin(
        &self,
        code: &str,
        spun_by: String,
        duration: f64,
        wheel: Vec<Candidate>,
        magnitude: SpinMagnitude,
        round: Option<RoundInfo>,
    ) -> Result<SpinRecord, AppError> {
        let start_rotation = self.repository.wheel_rotation(code)?;
        let total_rotation = {
            let mut rng = self.rng.lock().map_err(|_| AppError::Internal)?;
            random_rotation(&mut *rng, magnitude)
        };
        let selected_candidate = select_winner(&wheel, start_rotation + total_rotation)
            .cloned()
            .ok_or(AppError::EmptyWheel)?;

        let spin = SpinRecord {
            token: uuid::Uuid::new_v4().to_string(),
            duration,
            total_rotation,
            start_rotation,
            selected_candidate,
            spun_by,
            start_time: Utc::now().timestamp_millis(),
            candidate_ids: wheel.iter().map(|c| c.id).collect(),
            is_elimination_round: round.is_some(),
            round,
        };
        self.repository.set_current_spin(code, Some(spin.clone()))?;

        info!(
            room_code = %code,
            spun_by = %spin.spun_by,
            candidates = spin.candidate_ids.len(),
            elimination_round = spin.is_elimination_round,
            selected = %spin.selected_candidate.title,
            "Wheel spinning"
        );
        self.broadcast(code, &WebSocketMessage::spin_started(spin.clone()))
            .await;
        Ok(spin)
    }

    /// Announces the winner if the spin is still the room's current one
    pub(super) async fn finish_spin(&self, code: &str, token: &str) {
        match self.repository.complete_spin(code, token) {
            Ok(Some(spin)) => {
                info!(
                    room_code = %code,
                    winner = %spin.selected_candidate.title,
                    "Spin finished"
                );
                self.broadcast(
                    code,
                    &WebSocketMessage::spin_stopped(spin.selected_candidate, spin.spun_by, false),
                )
                .await;
            }
            Ok(None) => debug!(room_code = %code, "Spin was superseded, ignoring completion"),
            Err(e) => debug!(room_code = %code, error = %e, "Room gone before spin finished"),
        }
    }

    pub(super) fn completion_delay(&self, spin: &SpinRecord) -> Duration {
        Duration::from_secs_f64(spin.duration) + self.timing.completion_buffer
    }
}

fn clean_display_name(display_name: &str) -> Result<String, AppError> {
    let name = display_name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Display name is required".to_string()));
    }
    Ok(name.to_string())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::AppError;
use crate::wheel::Weighted;

/// Ephemeral handle of a live socket connection
pub type ConnectionId = String;

/// Candidate ids come from a timestamp plus a random suffix, so they are
/// unique in practice but not guaranteed to be
pub type CandidateId = i64;

/// Direction of a single participant's vote on a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Contribution of this vote to the tally
    pub fn value(self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// A connected member of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: ConnectionId, name: String) -> Self {
        Self {
            id,
            name,
            joined_at: Utc::now(),
        }
    }
}

/// Movie details submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster: Option<String>,
}

/// A movie on the wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub title: String,
    pub year: Option<i32>,
    pub poster: Option<String>,
    pub added_by: String,
    pub votes: i32,
    pub vetoed: bool,
    pub eliminated: bool,
}

impl Candidate {
    /// Creates a candidate with a freshly generated id
    pub fn new(details: NewCandidate, added_by: String) -> Self {
        Self::with_id(generate_candidate_id(), details, added_by)
    }

    pub fn with_id(id: CandidateId, details: NewCandidate, added_by: String) -> Self {
        Self {
            id,
            title: details.title,
            year: details.year,
            poster: details.poster,
            added_by,
            votes: 0,
            vetoed: false,
            eliminated: false,
        }
    }

    /// Whether this candidate can still land under the pointer
    pub fn is_eligible(&self) -> bool {
        !self.vetoed && !self.eliminated
    }
}

impl Weighted for Candidate {
    fn votes(&self) -> i32 {
        self.votes
    }
}

/// Millisecond timestamp with a random three digit suffix
pub fn generate_candidate_id() -> CandidateId {
    Utc::now().timestamp_millis() * 1000 + rand::random_range(0..1000)
}

/// Round counters carried by an elimination spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub current_round: u32,
    pub total_rounds: u32,
    pub remaining_candidates: usize,
}

/// The spin currently animating on every client in a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    /// Identifies this spin; completions carrying another token are stale
    pub token: String,
    /// Requested animation length in seconds
    pub duration: f64,
    /// Rotation added by this spin, in radians
    pub total_rotation: f64,
    /// Cumulative wheel rotation when the spin started
    pub start_rotation: f64,
    pub selected_candidate: Candidate,
    pub spun_by: String,
    /// Milliseconds since the unix epoch
    pub start_time: i64,
    /// Wheel layout the spin was resolved against, in segment order
    pub candidate_ids: Vec<CandidateId>,
    pub is_elimination_round: bool,
    #[serde(flatten)]
    pub round: Option<RoundInfo>,
}

impl SpinRecord {
    pub fn duration_ms(&self) -> i64 {
        (self.duration * 1000.0).round() as i64
    }
}

/// Progress of a running multi-round elimination sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationState {
    /// Identifies the sequence so a superseded one stops advancing
    pub sequence: String,
    pub current_round: u32,
    pub total_rounds: u32,
    pub eliminated: Vec<CandidateId>,
    pub started_by: String,
    pub duration: f64,
}

impl EliminationState {
    pub fn new(total_rounds: u32, started_by: String, duration: f64) -> Self {
        Self {
            sequence: uuid::Uuid::new_v4().to_string(),
            current_round: 0,
            total_rounds,
            eliminated: Vec::new(),
            started_by,
            duration,
        }
    }
}

/// In-memory room state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Roster in join order
    pub participants: Vec<Participant>,
    pub candidates: Vec<Candidate>,
    /// candidate id -> (connection -> vote)
    pub votes: HashMap<CandidateId, HashMap<ConnectionId, VoteDirection>>,
    /// connection -> has used veto
    pub vetoes: HashMap<ConnectionId, bool>,
    /// Radians in [0, 2π), advanced by every completed spin
    pub wheel_rotation: f64,
    pub current_spin: Option<SpinRecord>,
    pub elimination: Option<EliminationState>,
    pub shared_audio: Option<String>,
}

impl RoomModel {
    /// Creates an empty room, named `Room <code>` when no name is given
    pub fn new(code: String, name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Room {}", code));

        Self {
            code,
            name,
            created_at: Utc::now(),
            participants: Vec::new(),
            candidates: Vec::new(),
            votes: HashMap::new(),
            vetoes: HashMap::new(),
            wheel_rotation: 0.0,
            current_spin: None,
            elimination: None,
            shared_audio: None,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, connection_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == connection_id)
    }

    pub fn participant(&self, connection_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == connection_id)
    }

    /// Display name of a participant, `Unknown` for strangers
    pub fn participant_name(&self, connection_id: &str) -> String {
        self.participant(connection_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn participant_ids(&self) -> Vec<ConnectionId> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    pub fn add_participant(&mut self, participant: Participant) {
        if !self.has_participant(&participant.id) {
            self.participants.push(participant);
        }
    }

    /// Removes a participant from the roster, returning them if present.
    /// Their votes stay on the ledger.
    pub fn remove_participant(&mut self, connection_id: &str) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == connection_id)?;
        Some(self.participants.remove(index))
    }

    pub fn candidate(&self, candidate_id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }

    /// Candidates that may be put on the wheel, in list order
    pub fn eligible_candidates(&self) -> Vec<Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.is_eligible())
            .cloned()
            .collect()
    }

    pub fn add_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Removes every candidate carrying the id, along with its votes
    pub fn remove_candidate(&mut self, candidate_id: CandidateId) -> Result<(), AppError> {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id != candidate_id);
        if self.candidates.len() == before {
            return Err(AppError::InvalidOperation("Movie not found".to_string()));
        }
        self.votes.remove(&candidate_id);
        Ok(())
    }

    /// Records a vote and returns the new tally.
    ///
    /// Repeating the same direction retracts the vote; the opposite direction
    /// replaces it.
    pub fn apply_vote(
        &mut self,
        connection_id: &str,
        candidate_id: CandidateId,
        direction: VoteDirection,
    ) -> Result<i32, AppError> {
        let candidate = self
            .candidate(candidate_id)
            .ok_or_else(|| AppError::InvalidOperation("Movie not found".to_string()))?;
        if candidate.vetoed {
            return Err(AppError::InvalidOperation(
                "Cannot vote on a vetoed movie".to_string(),
            ));
        }

        let ledger = self.votes.entry(candidate_id).or_default();
        match ledger.get(connection_id) {
            Some(previous) if *previous == direction => {
                ledger.remove(connection_id);
            }
            _ => {
                ledger.insert(connection_id.to_string(), direction);
            }
        }

        let tally: i32 = ledger.values().map(|d| d.value()).sum();
        for candidate in self.candidates.iter_mut().filter(|c| c.id == candidate_id) {
            candidate.votes = tally;
        }
        Ok(tally)
    }

    pub fn has_used_veto(&self, connection_id: &str) -> bool {
        self.vetoes.get(connection_id).copied().unwrap_or(false)
    }

    /// Spends the participant's single veto on a candidate
    pub fn apply_veto(
        &mut self,
        connection_id: &str,
        candidate_id: CandidateId,
    ) -> Result<(), AppError> {
        if self.has_used_veto(connection_id) {
            return Err(AppError::InvalidOperation(
                "You have already used your veto".to_string(),
            ));
        }
        let candidate = self
            .candidate(candidate_id)
            .ok_or_else(|| AppError::InvalidOperation("Movie not found".to_string()))?;
        if candidate.vetoed {
            return Err(AppError::InvalidOperation(
                "Movie is already vetoed".to_string(),
            ));
        }

        for candidate in self.candidates.iter_mut().filter(|c| c.id == candidate_id) {
            candidate.vetoed = true;
        }
        self.vetoes.insert(connection_id.to_string(), true);
        Ok(())
    }

    /// Adds a finished spin's rotation to the resting wheel orientation
    pub fn fold_rotation(&mut self, rotation: f64) {
        self.wheel_rotation = crate::wheel::normalize_angle(self.wheel_rotation + rotation);
    }

    pub fn mark_eliminated(&mut self, candidate_id: CandidateId) {
        for candidate in self.candidates.iter_mut().filter(|c| c.id == candidate_id) {
            candidate.eliminated = true;
        }
    }

    /// Puts every eliminated candidate back on the wheel
    pub fn reset_eliminations(&mut self) {
        for candidate in &mut self.candidates {
            candidate.eliminated = false;
        }
    }

    /// Round the running elimination sequence is on, 0 when none is running
    pub fn elimination_round(&self) -> u32 {
        self.elimination
            .as_ref()
            .map(|state| state.current_round)
            .unwrap_or(0)
    }
}

#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::time::{sleep, Duration};

use movie_wheel::{
    room::models::{CandidateId, NewCandidate, VoteDirection},
    websockets::{MessageHandler, WebSocketMessage},
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a WebSocket message and wait for processing
    pub async fn send_message(&self, connection_id: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.send_raw(connection_id, message_json).await;
    }

    /// Send raw text as if it came off the socket
    pub async fn send_raw(&self, connection_id: &str, message: String) {
        self.input_handler
            .handle_message(connection_id, message)
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Adds a movie and returns the id the server gave it
    pub async fn add_movie(&self, participant: &str, title: &str) -> CandidateId {
        self.send_message(
            participant,
            WebSocketMessage::add_candidate(NewCandidate {
                title: title.to_string(),
                year: Some(2000),
                poster: None,
            }),
        )
        .await;

        self.room()
            .candidates
            .iter()
            .rev()
            .find(|c| c.title == title)
            .map(|c| c.id)
            .unwrap_or_else(|| panic!("{} was not added", title))
    }

    /// Adds several movies and clears the resulting broadcasts
    pub async fn add_movies(&self, participant: &str, titles: &[&str]) -> Vec<CandidateId> {
        let mut ids = Vec::new();
        for title in titles {
            ids.push(self.add_movie(participant, title).await);
        }
        self.clear_messages().await;
        ids
    }

    pub async fn send_vote(&self, participant: &str, candidate_id: CandidateId, up: bool) {
        let direction = if up {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        };
        self.send_message(
            participant,
            WebSocketMessage::vote_candidate(candidate_id, direction),
        )
        .await;
    }

    pub async fn send_veto(&self, participant: &str, candidate_id: CandidateId) {
        self.send_message(participant, WebSocketMessage::veto_candidate(candidate_id))
            .await;
    }

    pub async fn send_remove(&self, participant: &str, candidate_id: CandidateId) {
        self.send_message(participant, WebSocketMessage::remove_candidate(candidate_id))
            .await;
    }

    pub async fn send_spin(&self, participant: &str, duration: f64, elimination_rounds: u32) {
        self.send_message(
            participant,
            WebSocketMessage::start_spin(duration, elimination_rounds),
        )
        .await;
    }

    pub async fn send_leave(&self, participant: &str) {
        self.send_message(participant, WebSocketMessage::leave_room())
            .await;
    }

    pub async fn send_join(&self, connection_id: &str, code: &str) {
        self.send_message(
            connection_id,
            WebSocketMessage::join_room(code.to_string(), connection_id.to_string()),
        )
        .await;
    }

    /// Lets paused test time run forward
    pub async fn advance(&self, duration: Duration) {
        sleep(duration).await;
    }
}

#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;

use movie_wheel::{
    room::repository::{InMemoryRoomRepository, RoomRepository},
    session::{SessionCoordinator, SpinTiming},
    websockets::WebsocketReceiveHandler,
    RoomModel,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A room with its participants already in it. Connection ids double as
/// display names.
pub struct TestSetup {
    pub repository: Arc<InMemoryRoomRepository>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub coordinator: Arc<SessionCoordinator>,
    pub input_handler: WebsocketReceiveHandler,
    pub participants: Vec<String>,
    pub room_code: String,
}

impl TestSetup {
    pub fn room(&self) -> RoomModel {
        self.repository.get_room(&self.room_code).unwrap()
    }
}

pub struct TestSetupBuilder {
    participants: Vec<String>,
    timing: SpinTiming,
    seed: u64,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            participants: vec![],
            timing: SpinTiming {
                completion_buffer: Duration::from_millis(1000),
                elimination_pacing: Duration::from_millis(2000),
            },
            seed: 7,
        }
    }

    pub fn with_participants(mut self, participants: Vec<&str>) -> Self {
        self.participants = participants.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_participants(self) -> Self {
        self.with_participants(vec!["alice", "bob"])
    }

    pub fn with_three_participants(self) -> Self {
        self.with_participants(vec!["alice", "bob", "carol"])
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Creates the room through the first participant and joins the rest,
    /// then forgets the join traffic
    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let coordinator = Arc::new(
            SessionCoordinator::new(repository.clone(), mock_conn_manager.clone(), self.timing)
                .with_rng_seed(self.seed),
        );
        let input_handler = WebsocketReceiveHandler::new(coordinator.clone());

        let host = self
            .participants
            .first()
            .cloned()
            .unwrap_or_else(|| "host".to_string());
        let room = coordinator
            .create_room(&host, Some("Test night".to_string()), &host)
            .await
            .unwrap();

        for participant in self.participants.iter().skip(1) {
            coordinator
                .join_room(participant, &room.code, participant)
                .await
                .unwrap();
        }
        for participant in &self.participants {
            mock_conn_manager.add_connected(participant).await;
        }
        mock_conn_manager.clear_messages().await;

        TestSetup {
            repository,
            mock_conn_manager,
            coordinator,
            input_handler,
            participants: self.participants,
            room_code: room.code,
        }
    }
}

//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use movie_wheel::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    participants: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for everyone in the room
    pub fn for_all_participants(setup: &'a TestSetup) -> Self {
        let participants = setup.participants.iter().map(|s| s.as_str()).collect();
        Self {
            setup,
            participants,
        }
    }

    /// Create an assertion for specific participants
    pub fn for_participants(setup: &'a TestSetup, participants: Vec<&'a str>) -> Self {
        Self {
            setup,
            participants,
        }
    }

    /// Assert that participants received a specific message type (consumes the message from queue)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for participant in &self.participants {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(participant)
                .await;
            assert!(
                message.is_some(),
                "{} should have received a {:?} message",
                participant,
                expected_type
            );

            let msg: WebSocketMessage = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                participant
            );
            messages.push(msg);
        }

        // Broadcasts carry the same payload for everyone
        let first_payload = &messages[0].payload;
        for (i, msg) in messages.iter().enumerate().skip(1) {
            assert_eq!(
                &msg.payload, first_payload,
                "{} payload differs from {}",
                self.participants[i], self.participants[0]
            );
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert that participants have no pending messages
    pub async fn received_no_messages(self) {
        for participant in &self.participants {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(participant)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                participant,
                messages
            );
        }
    }

    /// Count how many pending messages of a specific type a participant has (non-consuming)
    pub async fn count_message_type(&self, participant: &str, msg_type: MessageType) -> usize {
        self.setup
            .mock_conn_manager
            .messages_of_type(participant, msg_type)
            .await
            .len()
    }

    /// Assert that participants received a sequence of message types in order (non-consuming)
    pub async fn received_message_sequence(
        self,
        expected_types: Vec<MessageType>,
    ) -> Vec<MessageContent> {
        let mut result_messages = vec![];

        for participant in &self.participants {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(participant)
                .await;
            assert!(
                messages.len() >= expected_types.len(),
                "{} should have received {} messages, but only got {}",
                participant,
                expected_types.len(),
                messages.len()
            );

            for (i, expected_type) in expected_types.iter().enumerate() {
                let msg: WebSocketMessage = serde_json::from_str(&messages[i])
                    .unwrap_or_else(|e| {
                        panic!("Failed to parse message {} for {}: {}", i, participant, e)
                    });

                assert_eq!(
                    msg.message_type, *expected_type,
                    "{} message {} has wrong type: expected {:?}, got {:?}",
                    participant, i, expected_type, msg.message_type
                );

                // Only collect messages from the first participant to avoid duplicates
                if participant == &self.participants[0] {
                    result_messages.push(MessageContent {
                        payload: msg.payload,
                    });
                }
            }
        }

        result_messages
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: Value,
}

impl MessageContent {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Assert a top-level payload field
    pub fn with_field(self, key: &str, expected: impl Into<Value>) -> Self {
        assert_eq!(self.payload[key], expected.into(), "field {}", key);
        self
    }

    pub fn with_candidate_id(self, expected: i64) -> Self {
        self.with_field("candidate_id", expected)
    }

    pub fn with_votes(self, expected: i32) -> Self {
        self.with_field("votes", expected)
    }

    pub fn with_participant_name(self, expected: &str) -> Self {
        assert_eq!(self.payload["participant"]["name"], expected);
        self
    }

    pub fn with_winner_title(self, expected: &str) -> Self {
        assert_eq!(self.payload["winner"]["title"], expected);
        self
    }

    pub fn winner_id(&self) -> i64 {
        self.payload["winner"]["id"].as_i64().unwrap()
    }

    pub fn selected_id(&self) -> i64 {
        self.payload["selected_candidate"]["id"].as_i64().unwrap()
    }

    pub fn with_message(self, expected: &str) -> Self {
        self.with_field("message", expected)
    }
}

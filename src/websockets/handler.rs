use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::room::models::NewCandidate;
use crate::session::SessionCoordinator;
use crate::shared::{AppError, AppState};
use crate::websockets::messages::{
    CreateRoomPayload, JoinRoomPayload, MessageType, RemoveCandidatePayload, SharedAudioPayload,
    StartSpinPayload, VetoPayload, VotePayload, WebSocketMessage,
};

use super::socket::{Connection, MessageHandler};

/// Message handler for receiving WebSocket messages from the client
pub struct WebsocketReceiveHandler {
    coordinator: Arc<SessionCoordinator>,
}

impl WebsocketReceiveHandler {
    pub fn new(coordinator: Arc<SessionCoordinator>) -> Self {
        Self { coordinator }
    }

    async fn dispatch(&self, connection_id: &str, message: WebSocketMessage) -> Result<(), AppError> {
        let coordinator = &self.coordinator;

        match message.message_type {
            MessageType::CreateRoom => {
                let payload: CreateRoomPayload = message.parse_payload()?;
                coordinator
                    .create_room(connection_id, payload.name, &payload.display_name)
                    .await?;
            }
            MessageType::JoinRoom => {
                let payload: JoinRoomPayload = message.parse_payload()?;
                coordinator
                    .join_room(connection_id, payload.code.trim(), &payload.display_name)
                    .await?;
            }
            MessageType::LeaveRoom => coordinator.leave_room(connection_id).await?,
            MessageType::AddCandidate => {
                let payload: NewCandidate = message.parse_payload()?;
                coordinator.add_candidate(connection_id, payload).await?;
            }
            MessageType::RemoveCandidate => {
                let payload: RemoveCandidatePayload = message.parse_payload()?;
                coordinator
                    .remove_candidate(connection_id, payload.candidate_id)
                    .await?;
            }
            MessageType::StartSpin => {
                let payload: StartSpinPayload = message.parse_payload()?;
                coordinator
                    .start_spin(connection_id, payload.duration, payload.elimination_rounds)
                    .await?;
            }
            MessageType::VoteCandidate => {
                let payload: VotePayload = message.parse_payload()?;
                coordinator
                    .vote(connection_id, payload.candidate_id, payload.direction)
                    .await?;
            }
            MessageType::VetoCandidate => {
                let payload: VetoPayload = message.parse_payload()?;
                coordinator.veto(connection_id, payload.candidate_id).await?;
            }
            MessageType::UpdateSharedAudio => {
                let payload: SharedAudioPayload = message.parse_payload()?;
                coordinator
                    .update_shared_audio(connection_id, payload.url)
                    .await?;
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "{:?} is not a client message",
                    other
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let result = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => self.dispatch(connection_id, ws_message).await,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                Err(AppError::BadRequest("Unrecognized message".to_string()))
            }
        };

        if let Err(e) = result {
            self.coordinator.report_failure(connection_id, &e).await;
        }
    }
}

/// WebSocket endpoint. Every socket gets a fresh connection id; room
/// membership is established over the socket with CREATE_ROOM or JOIN_ROOM.
///
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "WebSocket connection requested");

    ws.on_upgrade(move |socket| handle_websocket_connection(socket, connection_id, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    connection_id: String,
    app_state: AppState,
) {
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        app_state.coordinator.clone(),
    ));
    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => info!(connection_id = %connection_id, "WebSocket connection closed cleanly"),
        Err(e) => warn!(
            connection_id = %connection_id,
            error = ?e,
            "WebSocket connection error"
        ),
    }

    // Cleanup: stop delivering, then drop the participant from their room
    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;
    app_state.coordinator.disconnect(&connection_id).await;
}
